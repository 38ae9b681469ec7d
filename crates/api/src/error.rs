// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use shiftdesk::CoreError;
use shiftdesk_domain::DomainError;
use shiftdesk_persistence::PersistenceError;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// The broad class of an error, which decides how a caller recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad input; fix it and retry.
    Validation,
    /// The target changed underneath the request; re-fetch and decide again.
    Conflict,
    /// The target does not exist.
    NotFound,
    /// The store failed; nothing was applied.
    Transport,
    /// The actor may not perform the action.
    Authorization,
}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A domain rule refused the request.
    DomainRuleViolation {
        /// The stable code of the rule.
        rule: &'static str,
        /// A human-readable description of the violation.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The stable code.
        code: &'static str,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The request conflicts with the current state of a document.
    Conflict {
        /// The stable code.
        code: &'static str,
        /// A human-readable description of the conflict.
        message: String,
    },
    /// The store could not be read or written.
    Transport {
        /// A description of the failure.
        message: String,
    },
}

impl ApiError {
    /// The stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::DomainRuleViolation { rule, .. } => *rule,
            Self::ResourceNotFound { code, .. } | Self::Conflict { code, .. } => *code,
            Self::Transport { .. } => "IO_ERROR",
        }
    }

    /// The error's category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Authorization,
            Self::InvalidInput { .. } | Self::DomainRuleViolation { .. } => {
                ErrorCategory::Validation
            }
            Self::ResourceNotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Transport { .. } => ErrorCategory::Transport,
        }
    }

    /// The retry exhaustion error.
    #[must_use]
    pub fn contention(message: impl Into<String>) -> Self {
        Self::Conflict {
            code: "TRANSACTION_CONTENTION",
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::ResourceNotFound { code, message } => write!(f, "{code}: {message}"),
            Self::Conflict { code, message } => write!(f, "{code}: {message}"),
            Self::Transport { message } => write!(f, "Storage error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

/// Translates a domain error into an API error.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    let field: &str = match &err {
        DomainError::AllowanceNameRequired => {
            return ApiError::DomainRuleViolation {
                rule: "ALLOWANCE_NAME_REQUIRED",
                message,
            };
        }
        DomainError::WindowLocked { .. } => {
            return ApiError::DomainRuleViolation {
                rule: "WINDOW_LOCKED",
                message,
            };
        }
        DomainError::DateOutsideWindow { .. } => {
            return ApiError::DomainRuleViolation {
                rule: "DATE_OUTSIDE_WINDOW",
                message,
            };
        }
        DomainError::InvalidTime(_) | DomainError::InvalidTimeRange { .. } => "time",
        DomainError::InvalidMonthKey(_) => "month",
        DomainError::InvalidDateKey(_) | DomainError::DateOutsideMonth { .. } => "date",
        DomainError::InvalidTimestamp(_) => "timestamp",
        DomainError::InvalidWindowRange { .. } => "window",
        DomainError::MissingStoreId => "store_id",
        DomainError::InvalidDocumentPath(_) => "path",
        DomainError::InvalidRole(_) => "role",
        DomainError::InvalidCapability(_) => "capability",
        DomainError::InvalidApprovalKind(_) | DomainError::UntargetedPayload(_) => "type",
        DomainError::NotAttendanceRecord(_) => "attendance_path",
    };
    ApiError::InvalidInput {
        field: field.to_string(),
        message,
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    let code: &'static str = err.code();
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::CommentRequired { .. } | CoreError::MixedBatch => {
            ApiError::DomainRuleViolation {
                rule: code,
                message: err.to_string(),
            }
        }
        CoreError::MissingRoleDocument { .. }
        | CoreError::AllowanceNotFound { .. }
        | CoreError::MissingDocument { .. } => ApiError::ResourceNotFound {
            code,
            message: err.to_string(),
        },
        CoreError::StaleRoleDocument { .. }
        | CoreError::StaleAllowanceDocument { .. }
        | CoreError::AlreadyDecided { .. }
        | CoreError::SaveInFlight { .. } => ApiError::Conflict {
            code,
            message: err.to_string(),
        },
        CoreError::EmptySelection => ApiError::InvalidInput {
            field: String::from("approval_ids"),
            message: err.to_string(),
        },
        CoreError::EmptyBatch => ApiError::InvalidInput {
            field: String::from("target_role_doc_ids"),
            message: err.to_string(),
        },
        CoreError::DayNotLoaded { .. } => ApiError::InvalidInput {
            field: String::from("date"),
            message: err.to_string(),
        },
        CoreError::MalformedDocument { .. } => ApiError::InvalidInput {
            field: String::from("document"),
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::Contention { .. } => ApiError::contention(err.to_string()),
        _ => ApiError::Transport {
            message: err.to_string(),
        },
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        translate_core_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}
