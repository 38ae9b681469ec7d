// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use serde::{Deserialize, Serialize};
use shiftdesk_audit::{ApprovalLogEntry, DecisionAction};
use shiftdesk_domain::{
    ApprovalPayload, ApprovalStatus, DateKey, MonthKey, Role, ShiftEntry, Timestamp, WindowState,
};

use crate::auth::AuthenticatedActor;
use crate::error::{ApiError, ErrorCategory};

/// The acting user, as passed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorParams {
    /// The acting user's id.
    pub actor_id: String,
    /// The role that applies to the acting user in this store.
    pub actor_role: Role,
}

impl ActorParams {
    /// The authenticated actor these parameters describe.
    #[must_use]
    pub fn to_actor(&self) -> AuthenticatedActor {
        AuthenticatedActor::new(self.actor_id.clone(), self.actor_role)
    }
}

/// API request to parse free-form time ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSpansRequest {
    /// The raw input.
    pub text: String,
}

/// API request carrying a list of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntriesRequest {
    /// The entries.
    pub entries: Vec<ShiftEntry>,
}

/// API response for an entry merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEntriesResponse {
    /// The merged entries.
    pub entries: Vec<ShiftEntry>,
}

/// API response for a slot preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPreviewResponse {
    /// Width of one slot in minutes.
    pub slot_minutes: u16,
    /// The covering store per slot, from midnight.
    pub slots: Vec<Option<String>>,
    /// How many slots are covered.
    pub covered: usize,
}

/// API response for a day read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayResponse {
    /// The owning user.
    pub user_id: String,
    /// The month.
    pub month: MonthKey,
    /// The date.
    pub date: DateKey,
    /// Whether a day document exists.
    pub exists: bool,
    /// The stored entries.
    pub entries: Vec<ShiftEntry>,
    /// When the day was last written.
    pub updated_at: Option<Timestamp>,
}

/// API response for a day save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDayResponse {
    /// The date.
    pub date: DateKey,
    /// Whether anything was written.
    pub written: bool,
    /// The commit version, when written.
    pub version: Option<u64>,
    /// The entries now stored.
    pub entries: Vec<ShiftEntry>,
}

/// API response for a window refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowResponse {
    /// The month.
    pub month: MonthKey,
    /// The window.
    pub window: WindowState,
}

/// API request to fan one proxy submission out into a batch of approvals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBatchRequest {
    /// The store the approvals belong to.
    pub store_id: String,
    /// Target role document ids, `{userId}_{storeId}`.
    pub target_role_doc_ids: Vec<String>,
    /// The shared payload template.
    pub payload: ApprovalPayload,
    /// Optional title; the kind's label when absent.
    #[serde(default)]
    pub title: Option<String>,
    /// Whether deciding requires a comment.
    #[serde(default)]
    pub comment_required: bool,
}

/// API response for a created batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBatchResponse {
    /// The shared batch id.
    pub batch_id: String,
    /// How many approvals were created.
    pub created: usize,
    /// The created approval ids, in target order.
    pub approval_ids: Vec<String>,
}

/// API request to approve or reject a set of approvals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDecisionRequest {
    /// The selected approvals.
    pub approval_ids: Vec<String>,
    /// Approve or reject.
    pub action: DecisionAction,
    /// Optional comment applied to each decision.
    #[serde(default)]
    pub comment: Option<String>,
}

/// A machine-readable error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// The stable code.
    pub code: &'static str,
    /// The category.
    pub category: ErrorCategory,
    /// A human-readable message.
    pub message: String,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// The result of one approval within a bulk decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// The approval.
    pub approval_id: String,
    /// The resulting status, when the decision applied.
    pub status: Option<ApprovalStatus>,
    /// The failure, when it did not.
    pub error: Option<ErrorBody>,
}

/// API response for a bulk decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkDecisionResponse {
    /// The batch every selected approval belongs to, if any.
    pub batch_id: Option<String>,
    /// One outcome per selected approval, in request order.
    pub outcomes: Vec<BulkOutcome>,
}

/// API response listing audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLogsResponse {
    /// The approval.
    pub approval_id: String,
    /// Entries in creation order.
    pub entries: Vec<ApprovalLogEntry>,
}

/// Capability flag for UI gating.
///
/// Advisory only; the engines check again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The action is permitted.
    Allowed,
    /// The action is not permitted.
    Denied,
}

impl Capability {
    /// Returns true if the capability is allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Creates a capability from a boolean value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::Allowed } else { Self::Denied }
    }
}

impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(self.is_allowed())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        bool::deserialize(deserializer).map(Self::from_bool)
    }
}

/// Which approval kinds an actor may decide, and what they may submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalCapabilities {
    pub can_approve_shift_correction: Capability,
    pub can_approve_receipt: Capability,
    pub can_approve_store_membership: Capability,
    pub can_approve_employment_change: Capability,
    pub can_approve_allowance_add: Capability,
    pub can_approve_allowance_update: Capability,
    pub can_approve_allowance_end: Capability,
    pub can_approve_commute_update: Capability,
    pub can_submit_proxy: Capability,
    pub can_submit_shift_request: Capability,
}
