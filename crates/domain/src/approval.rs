// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Approval records and their typed payloads.
//!
//! The set of approval kinds is closed. Each kind carries its own payload
//! shape, discriminated by the `type` tag, so dispatch over kinds is checked
//! for exhaustiveness at compile time.

use crate::calendar::{DateKey, Timestamp};
use crate::capability::Role;
use crate::error::DomainError;
use crate::paths::{DocPath, collections};
use crate::store_role::{CommuteRequest, EmploymentTerms};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// The kind of change an approval requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalKind {
    /// Attendance correction.
    #[serde(rename = "shiftCorrection")]
    ShiftCorrection,
    /// Expense receipt.
    #[serde(rename = "receipt")]
    Receipt,
    /// Request to join a store.
    #[serde(rename = "storeMembership")]
    StoreMembership,
    /// Change of employment terms.
    #[serde(rename = "employment_change")]
    EmploymentChange,
    /// New allowance.
    #[serde(rename = "allowance_add")]
    AllowanceAdd,
    /// Change to an existing allowance.
    #[serde(rename = "allowance_update")]
    AllowanceUpdate,
    /// End an existing allowance.
    #[serde(rename = "allowance_end")]
    AllowanceEnd,
    /// Change of commute policy.
    #[serde(rename = "commute_update")]
    CommuteUpdate,
}

impl ApprovalKind {
    /// Every kind.
    pub const ALL: [Self; 8] = [
        Self::ShiftCorrection,
        Self::Receipt,
        Self::StoreMembership,
        Self::EmploymentChange,
        Self::AllowanceAdd,
        Self::AllowanceUpdate,
        Self::AllowanceEnd,
        Self::CommuteUpdate,
    ];

    /// The stored `type` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShiftCorrection => "shiftCorrection",
            Self::Receipt => "receipt",
            Self::StoreMembership => "storeMembership",
            Self::EmploymentChange => "employment_change",
            Self::AllowanceAdd => "allowance_add",
            Self::AllowanceUpdate => "allowance_update",
            Self::AllowanceEnd => "allowance_end",
            Self::CommuteUpdate => "commute_update",
        }
    }

    /// A short human-readable label used for approval titles.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShiftCorrection => "Shift correction",
            Self::Receipt => "Receipt",
            Self::StoreMembership => "Store membership",
            Self::EmploymentChange => "Employment change",
            Self::AllowanceAdd => "Add allowance",
            Self::AllowanceUpdate => "Update allowance",
            Self::AllowanceEnd => "End allowance",
            Self::CommuteUpdate => "Commute update",
        }
    }

    /// Whether approvals of this kind target a role record and are subject
    /// to the staleness fence.
    #[must_use]
    pub const fn is_role_targeted(self) -> bool {
        matches!(
            self,
            Self::EmploymentChange
                | Self::AllowanceAdd
                | Self::AllowanceUpdate
                | Self::AllowanceEnd
                | Self::CommuteUpdate
        )
    }
}

impl FromStr for ApprovalKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::InvalidApprovalKind(s.to_string()))
    }
}

impl std::fmt::Display for ApprovalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval lifecycle. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved and applied.
    Approved,
    /// Rejected.
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        })
    }
}

/// Reference to a target document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocRef {
    /// Collection name.
    pub col: String,
    /// Document id.
    pub id: String,
}

impl DocRef {
    /// The referenced document's path.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference does not form a valid path.
    pub fn path(&self) -> Result<DocPath, DomainError> {
        DocPath::new(&self.col, &self.id)
    }
}

/// Position of an approval within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchContext {
    /// Shared batch id.
    pub id: String,
    /// Zero-based position.
    pub index: u32,
    /// Batch size.
    pub count: u32,
}

/// Payload of a shift correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftCorrectionPayload {
    /// The correction request document id.
    pub correction_id: String,
    /// Path of the attendance record to patch.
    pub attendance_path: DocPath,
    /// Fields merged into the attendance record on approval.
    #[serde(default)]
    pub attendance_patch: Map<String, Value>,
}

/// Payload of a receipt approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    /// The receipt document id.
    pub receipt_id: String,
}

/// Payload of a store membership approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMembershipPayload {
    /// The join request document id.
    pub join_request_id: String,
    /// The joining user.
    pub user_id: String,
    /// Role granted on approval; `staff` when absent.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Payload of an employment change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentChangePayload {
    /// Injected per target at batch creation.
    #[serde(default)]
    pub target_user_id: String,
    /// Injected per target at batch creation.
    #[serde(default)]
    pub target_role_doc_id: String,
    /// The new terms, replacing the stored ones.
    pub employment: EmploymentTerms,
}

/// Payload shared by the three allowance kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceChangePayload {
    /// Injected per target at batch creation.
    #[serde(default)]
    pub target_user_id: String,
    /// Injected per target at batch creation.
    #[serde(default)]
    pub target_role_doc_id: String,
    /// Allowance name; its slug keys the allowance document.
    #[serde(default)]
    pub name: String,
    /// Allowance master.
    #[serde(default)]
    pub master_id: Option<String>,
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: Option<i64>,
    /// Whether the allowance is tax exempt.
    #[serde(default)]
    pub tax_exempt: Option<bool>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// First date paid.
    #[serde(default)]
    pub effective_from: Option<DateKey>,
    /// Last date paid.
    #[serde(default)]
    pub effective_to: Option<DateKey>,
}

/// Payload of a commute policy change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuteUpdatePayload {
    /// Injected per target at batch creation.
    #[serde(default)]
    pub target_user_id: String,
    /// Injected per target at batch creation.
    #[serde(default)]
    pub target_role_doc_id: String,
    /// The requested policy; its mode is normalized on approval.
    pub commute: CommuteRequest,
}

/// The typed payload of an approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApprovalPayload {
    /// See [`ShiftCorrectionPayload`].
    #[serde(rename = "shiftCorrection")]
    ShiftCorrection(ShiftCorrectionPayload),
    /// See [`ReceiptPayload`].
    #[serde(rename = "receipt")]
    Receipt(ReceiptPayload),
    /// See [`StoreMembershipPayload`].
    #[serde(rename = "storeMembership")]
    StoreMembership(StoreMembershipPayload),
    /// See [`EmploymentChangePayload`].
    #[serde(rename = "employment_change")]
    EmploymentChange(EmploymentChangePayload),
    /// See [`AllowanceChangePayload`].
    #[serde(rename = "allowance_add")]
    AllowanceAdd(AllowanceChangePayload),
    /// See [`AllowanceChangePayload`].
    #[serde(rename = "allowance_update")]
    AllowanceUpdate(AllowanceChangePayload),
    /// See [`AllowanceChangePayload`].
    #[serde(rename = "allowance_end")]
    AllowanceEnd(AllowanceChangePayload),
    /// See [`CommuteUpdatePayload`].
    #[serde(rename = "commute_update")]
    CommuteUpdate(CommuteUpdatePayload),
}

impl ApprovalPayload {
    /// The payload's kind.
    #[must_use]
    pub const fn kind(&self) -> ApprovalKind {
        match self {
            Self::ShiftCorrection(_) => ApprovalKind::ShiftCorrection,
            Self::Receipt(_) => ApprovalKind::Receipt,
            Self::StoreMembership(_) => ApprovalKind::StoreMembership,
            Self::EmploymentChange(_) => ApprovalKind::EmploymentChange,
            Self::AllowanceAdd(_) => ApprovalKind::AllowanceAdd,
            Self::AllowanceUpdate(_) => ApprovalKind::AllowanceUpdate,
            Self::AllowanceEnd(_) => ApprovalKind::AllowanceEnd,
            Self::CommuteUpdate(_) => ApprovalKind::CommuteUpdate,
        }
    }

    /// The target role document id for role-targeted kinds.
    #[must_use]
    pub fn target_role_doc_id(&self) -> Option<&str> {
        let target: Option<&str> = match self {
            Self::EmploymentChange(p) => Some(p.target_role_doc_id.as_str()),
            Self::AllowanceAdd(p) | Self::AllowanceUpdate(p) | Self::AllowanceEnd(p) => {
                Some(p.target_role_doc_id.as_str())
            }
            Self::CommuteUpdate(p) => Some(p.target_role_doc_id.as_str()),
            Self::ShiftCorrection(_) | Self::Receipt(_) | Self::StoreMembership(_) => None,
        };
        target.filter(|id| !id.is_empty())
    }

    /// Returns a copy of this payload aimed at one role record.
    ///
    /// # Errors
    ///
    /// Returns `UntargetedPayload` for kinds that do not target role records.
    pub fn with_target(&self, user_id: &str, role_doc_id: &str) -> Result<Self, DomainError> {
        let mut payload: Self = self.clone();
        let (target_user_id, target_role_doc_id): (&mut String, &mut String) = match &mut payload {
            Self::EmploymentChange(p) => (&mut p.target_user_id, &mut p.target_role_doc_id),
            Self::AllowanceAdd(p) | Self::AllowanceUpdate(p) | Self::AllowanceEnd(p) => {
                (&mut p.target_user_id, &mut p.target_role_doc_id)
            }
            Self::CommuteUpdate(p) => (&mut p.target_user_id, &mut p.target_role_doc_id),
            Self::ShiftCorrection(_) | Self::Receipt(_) | Self::StoreMembership(_) => {
                return Err(DomainError::UntargetedPayload(self.kind()));
            }
        };
        user_id.clone_into(target_user_id);
        role_doc_id.clone_into(target_role_doc_id);
        Ok(payload)
    }
}

/// An approval record.
///
/// Created pending; decided exactly once; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSummary {
    /// Document id.
    pub id: String,
    /// The store the change applies to.
    pub store_id: String,
    /// Mirrors the payload tag for querying.
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    /// Lifecycle status.
    pub status: ApprovalStatus,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// The submitting user.
    pub submitted_by: String,
    /// Submission instant; the staleness fence compares against it.
    #[serde(default)]
    pub submitted_at: Option<Timestamp>,
    /// Whether deciding requires a comment.
    #[serde(default)]
    pub comment_required: bool,
    /// Typed change request.
    pub payload: ApprovalPayload,
    /// Target document, if any.
    #[serde(default)]
    pub target: Option<DocRef>,
    /// Batch membership, if created as part of a batch.
    #[serde(default)]
    pub batch_context: Option<BatchContext>,
    /// Deciding user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    /// Decision instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<Timestamp>,
    /// Decision comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ApprovalSummary {
    /// The batch id, if batched.
    #[must_use]
    pub fn batch_id(&self) -> Option<&str> {
        self.batch_context.as_ref().map(|context| context.id.as_str())
    }

    /// Whether the approval is still awaiting a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    /// Checks that the top-level `type` agrees with the payload tag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidApprovalKind` on disagreement.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.kind != self.payload.kind() {
            return Err(DomainError::InvalidApprovalKind(format!(
                "{} (payload is {})",
                self.kind,
                self.payload.kind()
            )));
        }
        Ok(())
    }

    /// The role record this approval targets, for role-targeted kinds.
    #[must_use]
    pub fn role_target(&self) -> Option<DocRef> {
        self.payload.target_role_doc_id().map(|id| DocRef {
            col: collections::USER_STORE_ROLES.to_string(),
            id: id.to_string(),
        })
    }
}
