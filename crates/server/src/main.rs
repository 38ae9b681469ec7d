// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;

use axum::{
    Json, Router,
    extract::{FromRef, Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use shiftdesk_api::{
    ActorParams, ApiError, ApprovalCapabilities, ApprovalEngine, ApprovalLogsResponse,
    AuthenticatedActor, AuthorizationService, BatchApprovalCoordinator, BulkDecisionRequest,
    BulkDecisionResponse, CreateBatchRequest, CreateBatchResponse, DayRequestSync, DayResponse,
    DecisionInput, EntriesRequest, MergeEntriesResponse, ParseSpansRequest, SaveDayResponse,
    SaveOutcome, ShiftWindowGate, SlotPreviewResponse, WindowResponse,
    compute_approval_capabilities,
};
use shiftdesk_audit::{ApprovalLogEntry, DecisionAction};
use shiftdesk_domain::{
    ApprovalSummary, DateKey, DayRequest, MonthKey, SLOT_MINUTES, ShiftEntry, ShiftWindow,
    SlotGrid, SpanParseResult, WindowState, merge_entries, paint_slots, parse_span_input,
};
use shiftdesk_persistence::{DocumentStore, Persistence};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::live::{LiveFeed, live_events_handler};

/// Shiftdesk Server - HTTP server for shift requests and approvals
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: IpAddr,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The document store every engine works against.
    store: Arc<dyn DocumentStore>,
    /// Approve and reject.
    approvals: Arc<ApprovalEngine>,
    /// Proxy submission fan-out.
    batches: Arc<BatchApprovalCoordinator>,
    /// Submission window reads and writes.
    gate: ShiftWindowGate,
    /// Change notifications for WebSocket clients.
    live: LiveFeed,
}

impl AppState {
    fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            approvals: Arc::new(ApprovalEngine::new(Arc::clone(&store))),
            batches: Arc::new(BatchApprovalCoordinator::new(Arc::clone(&store))),
            gate: ShiftWindowGate::new(Arc::clone(&store)),
            live: LiveFeed::new(Arc::clone(&store)),
            store,
        }
    }

    /// A day sync for one user's month, gated by the month's window.
    fn day_sync(&self, user_id: String, month: MonthKey) -> DayRequestSync {
        DayRequestSync::new(Arc::clone(&self.store), user_id, month)
            .with_window_gate(self.gate.clone())
    }
}

impl FromRef<AppState> for LiveFeed {
    fn from_ref(state: &AppState) -> Self {
        state.live.clone()
    }
}

/// API request for saving a day.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SaveDayApiRequest {
    /// The acting user.
    #[serde(flatten)]
    actor: ActorParams,
    /// The desired entries; an empty list removes the day.
    entries: Vec<ShiftEntry>,
}

/// API request for configuring a month's submission window.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ConfigureWindowApiRequest {
    /// The acting user.
    #[serde(flatten)]
    actor: ActorParams,
    /// The new window.
    window: ShiftWindow,
}

/// API request for creating a batch of approvals.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct CreateBatchApiRequest {
    /// The acting user.
    #[serde(flatten)]
    actor: ActorParams,
    /// The batch to create.
    #[serde(flatten)]
    request: CreateBatchRequest,
}

/// API request for approving or rejecting one approval.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct DecisionApiRequest {
    /// The acting user.
    #[serde(flatten)]
    actor: ActorParams,
    /// Optional decision comment.
    #[serde(default)]
    comment: Option<String>,
}

/// API request for a bulk decision.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct BulkDecisionApiRequest {
    /// The acting user.
    #[serde(flatten)]
    actor: ActorParams,
    /// The selection and decision.
    #[serde(flatten)]
    request: BulkDecisionRequest,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Stable machine-readable code.
    code: String,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The stable error code.
    code: &'static str,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            code: self.code.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Transport { .. } => {
                error!(error = %err, "Storage error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Parses the month and date segments of a day path.
fn parse_day_address(month: &str, date: &str) -> Result<(MonthKey, DateKey), HttpError> {
    let month: MonthKey = month.parse().map_err(ApiError::from)?;
    let date: DateKey = date.parse().map_err(ApiError::from)?;
    Ok((month, date))
}

fn validate_entries(entries: &[ShiftEntry]) -> Result<(), HttpError> {
    for entry in entries {
        entry.validate().map_err(ApiError::from)?;
    }
    Ok(())
}

/// Handler for POST `/spans/parse` endpoint.
async fn handle_parse_spans(Json(req): Json<ParseSpansRequest>) -> Json<SpanParseResult> {
    Json(parse_span_input(&req.text))
}

/// Handler for POST `/entries/merge` endpoint.
async fn handle_merge_entries(
    Json(req): Json<EntriesRequest>,
) -> Result<Json<MergeEntriesResponse>, HttpError> {
    validate_entries(&req.entries)?;
    Ok(Json(MergeEntriesResponse {
        entries: merge_entries(&req.entries),
    }))
}

/// Handler for POST `/entries/slots` endpoint.
///
/// Previews how the entries paint onto the day's slot grid.
async fn handle_slot_preview(
    Json(req): Json<EntriesRequest>,
) -> Result<Json<SlotPreviewResponse>, HttpError> {
    validate_entries(&req.entries)?;
    let grid: SlotGrid = paint_slots(&req.entries);
    Ok(Json(SlotPreviewResponse {
        slot_minutes: SLOT_MINUTES,
        slots: grid.slots().to_vec(),
        covered: grid.covered_count(),
    }))
}

/// Handler for GET `/days/{user_id}/{month}/{date}` endpoint.
async fn handle_get_day(
    AxumState(app_state): AxumState<AppState>,
    Path((user_id, month, date)): Path<(String, String, String)>,
) -> Result<Json<DayResponse>, HttpError> {
    let (month, date) = parse_day_address(&month, &date)?;
    let sync: DayRequestSync = app_state.day_sync(user_id.clone(), month);
    let stored: Option<DayRequest> = sync.load_day(date).await?;

    let response: DayResponse = match stored {
        Some(request) => DayResponse {
            user_id,
            month,
            date,
            exists: true,
            entries: request.entries,
            updated_at: request.updated_at,
        },
        None => DayResponse {
            user_id,
            month,
            date,
            exists: false,
            entries: Vec::new(),
            updated_at: None,
        },
    };
    Ok(Json(response))
}

/// Saves `entries` for the day, or removes the day when `entries` is `None`.
async fn write_day(
    app_state: &AppState,
    actor: &AuthenticatedActor,
    user_id: String,
    month: MonthKey,
    date: DateKey,
    entries: Option<&[ShiftEntry]>,
) -> Result<SaveDayResponse, HttpError> {
    AuthorizationService::authorize_day_write(actor, &user_id).map_err(ApiError::from)?;
    let sync: DayRequestSync = app_state.day_sync(user_id, month);
    let outcome: SaveOutcome = match entries {
        Some(entries) => sync.save_day_diff(date, entries).await?,
        None => sync.remove_day(date).await?,
    };
    let entries: Vec<ShiftEntry> = sync
        .snapshot(date)
        .await
        .map(|day| day.entries)
        .unwrap_or_default();

    let version: Option<u64> = match outcome {
        SaveOutcome::Written { version } => Some(version),
        SaveOutcome::Unchanged => None,
    };
    Ok(SaveDayResponse {
        date,
        written: version.is_some(),
        version,
        entries,
    })
}

/// Handler for PUT `/days/{user_id}/{month}/{date}` endpoint.
///
/// Writes only when the normalized entries differ from what is stored.
async fn handle_save_day(
    AxumState(app_state): AxumState<AppState>,
    Path((user_id, month, date)): Path<(String, String, String)>,
    Json(req): Json<SaveDayApiRequest>,
) -> Result<Json<SaveDayResponse>, HttpError> {
    info!(
        actor_id = %req.actor.actor_id,
        user_id = %user_id,
        date = %date,
        entries = req.entries.len(),
        "Handling save_day request"
    );
    let (month, date) = parse_day_address(&month, &date)?;
    let actor: AuthenticatedActor = req.actor.to_actor();
    let response: SaveDayResponse =
        write_day(&app_state, &actor, user_id, month, date, Some(&req.entries)).await?;
    Ok(Json(response))
}

/// Handler for DELETE `/days/{user_id}/{month}/{date}` endpoint.
async fn handle_remove_day(
    AxumState(app_state): AxumState<AppState>,
    Path((user_id, month, date)): Path<(String, String, String)>,
    Query(params): Query<ActorParams>,
) -> Result<Json<SaveDayResponse>, HttpError> {
    info!(
        actor_id = %params.actor_id,
        user_id = %user_id,
        date = %date,
        "Handling remove_day request"
    );
    let (month, date) = parse_day_address(&month, &date)?;
    let response: SaveDayResponse =
        write_day(&app_state, &params.to_actor(), user_id, month, date, None).await?;
    Ok(Json(response))
}

/// Handler for GET `/windows/{month}` endpoint.
async fn handle_get_window(
    AxumState(app_state): AxumState<AppState>,
    Path(month): Path<String>,
) -> Result<Json<WindowResponse>, HttpError> {
    let month: MonthKey = month.parse().map_err(ApiError::from)?;
    let window: WindowState = app_state.gate.refresh(month).await?;
    Ok(Json(WindowResponse { month, window }))
}

/// Handler for PUT `/windows/{month}` endpoint.
async fn handle_configure_window(
    AxumState(app_state): AxumState<AppState>,
    Path(month): Path<String>,
    Json(req): Json<ConfigureWindowApiRequest>,
) -> Result<Json<WindowResponse>, HttpError> {
    info!(
        actor_id = %req.actor.actor_id,
        month = %month,
        locked = req.window.locked,
        "Handling configure_window request"
    );
    let month: MonthKey = month.parse().map_err(ApiError::from)?;
    let window: WindowState = app_state
        .gate
        .configure(month, req.window, &req.actor.to_actor())
        .await?;
    Ok(Json(WindowResponse { month, window }))
}

/// Handler for POST `/approvals/batch` endpoint.
async fn handle_create_batch(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateBatchApiRequest>,
) -> Result<Json<CreateBatchResponse>, HttpError> {
    info!(
        actor_id = %req.actor.actor_id,
        store_id = %req.request.store_id,
        targets = req.request.target_role_doc_ids.len(),
        "Handling create_batch request"
    );
    let response: CreateBatchResponse = app_state
        .batches
        .create_batch_approvals(&req.request, &req.actor.to_actor())
        .await?;
    Ok(Json(response))
}

async fn decide(
    app_state: &AppState,
    approval_id: &str,
    action: DecisionAction,
    req: DecisionApiRequest,
) -> Result<Json<ApprovalSummary>, HttpError> {
    info!(
        actor_id = %req.actor.actor_id,
        approval_id = %approval_id,
        %action,
        "Handling decision request"
    );
    let input: DecisionInput = DecisionInput::new(req.actor.to_actor(), req.comment);
    let decided: ApprovalSummary = match action {
        DecisionAction::Approve => {
            app_state
                .approvals
                .approve_approval(approval_id, &input)
                .await?
        }
        DecisionAction::Reject => app_state.approvals.reject_approval(approval_id, &input).await?,
    };
    Ok(Json(decided))
}

/// Handler for POST `/approvals/{id}/approve` endpoint.
async fn handle_approve(
    AxumState(app_state): AxumState<AppState>,
    Path(approval_id): Path<String>,
    Json(req): Json<DecisionApiRequest>,
) -> Result<Json<ApprovalSummary>, HttpError> {
    decide(&app_state, &approval_id, DecisionAction::Approve, req).await
}

/// Handler for POST `/approvals/{id}/reject` endpoint.
async fn handle_reject(
    AxumState(app_state): AxumState<AppState>,
    Path(approval_id): Path<String>,
    Json(req): Json<DecisionApiRequest>,
) -> Result<Json<ApprovalSummary>, HttpError> {
    decide(&app_state, &approval_id, DecisionAction::Reject, req).await
}

/// Handler for POST `/approvals/bulk` endpoint.
async fn handle_bulk_decision(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BulkDecisionApiRequest>,
) -> Result<Json<BulkDecisionResponse>, HttpError> {
    info!(
        actor_id = %req.actor.actor_id,
        count = req.request.approval_ids.len(),
        action = %req.request.action,
        "Handling bulk decision request"
    );
    let input: DecisionInput = DecisionInput::new(req.actor.to_actor(), req.request.comment);
    let response: BulkDecisionResponse = app_state
        .approvals
        .bulk_decide(&req.request.approval_ids, req.request.action, &input)
        .await?;
    Ok(Json(response))
}

/// Handler for GET `/approvals/{id}/logs` endpoint.
async fn handle_approval_logs(
    AxumState(app_state): AxumState<AppState>,
    Path(approval_id): Path<String>,
) -> Result<Json<ApprovalLogsResponse>, HttpError> {
    let entries: Vec<ApprovalLogEntry> = app_state.approvals.approval_logs(&approval_id).await?;
    Ok(Json(ApprovalLogsResponse {
        approval_id,
        entries,
    }))
}

/// Handler for GET `/capabilities` endpoint.
async fn handle_capabilities(Query(params): Query<ActorParams>) -> Json<ApprovalCapabilities> {
    Json(compute_approval_capabilities(&params.to_actor()))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/spans/parse", post(handle_parse_spans))
        .route("/entries/merge", post(handle_merge_entries))
        .route("/entries/slots", post(handle_slot_preview))
        .route(
            "/days/{user_id}/{month}/{date}",
            get(handle_get_day)
                .put(handle_save_day)
                .delete(handle_remove_day),
        )
        .route(
            "/windows/{month}",
            get(handle_get_window).put(handle_configure_window),
        )
        .route("/approvals/batch", post(handle_create_batch))
        .route("/approvals/bulk", post(handle_bulk_decision))
        .route("/approvals/{approval_id}/approve", post(handle_approve))
        .route("/approvals/{approval_id}/reject", post(handle_reject))
        .route("/approvals/{approval_id}/logs", get(handle_approval_logs))
        .route("/capabilities", get(handle_capabilities))
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Shiftdesk Server");

    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!(path = %db_path.display(), "Using file-based database");
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let app: Router = build_router(AppState::new(Arc::new(persistence)));

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
