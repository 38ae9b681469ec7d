// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shiftdesk_domain::{ApprovalStatus, DomainError};

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The role record an approval targets does not exist.
    MissingRoleDocument {
        /// The role document id.
        role_doc_id: String,
    },
    /// The role record changed after the approval was submitted.
    StaleRoleDocument {
        /// The role document id.
        role_doc_id: String,
    },
    /// The allowance changed after the approval was submitted.
    StaleAllowanceDocument {
        /// The allowance document id.
        allowance_id: String,
    },
    /// The allowance to update or end does not exist.
    AllowanceNotFound {
        /// The allowance document id.
        allowance_id: String,
    },
    /// A document the transition depends on does not exist.
    MissingDocument {
        /// The document path.
        path: String,
    },
    /// The approval has already been decided.
    AlreadyDecided {
        /// The approval id.
        approval_id: String,
        /// Its terminal status.
        status: ApprovalStatus,
    },
    /// The approval requires a comment and none was given.
    CommentRequired {
        /// The approval id.
        approval_id: String,
    },
    /// A bulk selection mixes batches, or batched with unbatched approvals.
    MixedBatch,
    /// A bulk selection is empty.
    EmptySelection,
    /// A batch has no targets.
    EmptyBatch,
    /// A day must be loaded before it can be saved.
    DayNotLoaded {
        /// The date.
        date: String,
    },
    /// A save is already in flight for the day.
    SaveInFlight {
        /// The date.
        date: String,
    },
    /// A stored document does not have the expected shape.
    MalformedDocument {
        /// The document path.
        path: String,
        /// The decoding failure.
        reason: String,
    },
}

impl CoreError {
    /// The stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DomainViolation(err) => match err {
                DomainError::AllowanceNameRequired => "ALLOWANCE_NAME_REQUIRED",
                DomainError::WindowLocked { .. } => "WINDOW_LOCKED",
                DomainError::DateOutsideWindow { .. } => "DATE_OUTSIDE_WINDOW",
                _ => "INVALID_INPUT",
            },
            Self::MissingRoleDocument { .. } => "MISSING_ROLE_DOCUMENT",
            Self::StaleRoleDocument { .. } => "STALE_ROLE_DOCUMENT",
            Self::StaleAllowanceDocument { .. } => "STALE_ALLOWANCE_DOCUMENT",
            Self::AllowanceNotFound { .. } => "ALLOWANCE_NOT_FOUND",
            Self::MissingDocument { .. } => "NOT_FOUND",
            Self::AlreadyDecided { .. } => "ALREADY_DECIDED",
            Self::CommentRequired { .. } => "COMMENT_REQUIRED",
            Self::MixedBatch => "MIXED_BATCH",
            Self::SaveInFlight { .. } => "TRANSACTION_CONTENTION",
            Self::EmptySelection
            | Self::EmptyBatch
            | Self::DayNotLoaded { .. }
            | Self::MalformedDocument { .. } => "INVALID_INPUT",
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::MissingRoleDocument { role_doc_id } => {
                write!(f, "Role document '{role_doc_id}' does not exist")
            }
            Self::StaleRoleDocument { role_doc_id } => write!(
                f,
                "Role document '{role_doc_id}' was updated after this request was submitted"
            ),
            Self::StaleAllowanceDocument { allowance_id } => write!(
                f,
                "Allowance '{allowance_id}' was updated after this request was submitted"
            ),
            Self::AllowanceNotFound { allowance_id } => {
                write!(f, "Allowance '{allowance_id}' does not exist")
            }
            Self::MissingDocument { path } => write!(f, "Document '{path}' does not exist"),
            Self::AlreadyDecided {
                approval_id,
                status,
            } => write!(f, "Approval '{approval_id}' is already {status}"),
            Self::CommentRequired { approval_id } => {
                write!(f, "Approval '{approval_id}' requires a comment")
            }
            Self::MixedBatch => write!(
                f,
                "Selection mixes approvals from different batches or batched with unbatched approvals"
            ),
            Self::EmptySelection => write!(f, "No approvals selected"),
            Self::EmptyBatch => write!(f, "A batch requires at least one target"),
            Self::DayNotLoaded { date } => write!(f, "Day {date} has not been loaded"),
            Self::SaveInFlight { date } => write!(f, "A save is already in flight for {date}"),
            Self::MalformedDocument { path, reason } => {
                write!(f, "Document '{path}' is malformed: {reason}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
