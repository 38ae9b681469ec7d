// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The engine contract for shift request sync and approval workflows.
//!
//! Engines are built with explicit dependencies: a shared
//! [`DocumentStore`](shiftdesk_persistence::DocumentStore), the acting user,
//! and the month or store they work in. Nothing here holds global state.

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

mod approvals;
mod auth;
mod batch;
mod capabilities;
mod day_sync;
mod error;
mod request_response;
mod window;

#[cfg(test)]
mod tests;

pub use approvals::{ApprovalEngine, DEFAULT_MAX_ATTEMPTS, DecisionInput};
pub use auth::{AuthenticatedActor, AuthorizationService};
pub use batch::BatchApprovalCoordinator;
pub use capabilities::compute_approval_capabilities;
pub use day_sync::{DayRequestSync, MonthSubscription, SaveOutcome};
pub use error::{
    ApiError, AuthError, ErrorCategory, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use request_response::{
    ActorParams, ApprovalCapabilities, ApprovalLogsResponse, BulkDecisionRequest,
    BulkDecisionResponse, BulkOutcome, Capability, CreateBatchRequest, CreateBatchResponse,
    DayResponse, EntriesRequest, ErrorBody, MergeEntriesResponse, ParseSpansRequest,
    SaveDayResponse, SlotPreviewResponse, WindowResponse,
};
pub use window::{ShiftWindowGate, WindowWatch};
