// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::approval::ApprovalKind;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A time of day is not a valid `HH:MM` value.
    InvalidTime(String),
    /// A time range does not end after it starts.
    InvalidTimeRange {
        /// The start of the range.
        start: String,
        /// The end of the range.
        end: String,
    },
    /// A month key is not a valid `YYYYMM` value.
    InvalidMonthKey(String),
    /// A date key is not a valid `YYYY-MM-DD` value.
    InvalidDateKey(String),
    /// A date does not belong to the month it was filed under.
    DateOutsideMonth {
        /// The date.
        date: String,
        /// The month key.
        month: String,
    },
    /// A timestamp could not be parsed as RFC 3339.
    InvalidTimestamp(String),
    /// A submission window ends before it starts.
    InvalidWindowRange {
        /// The configured start date.
        start: String,
        /// The configured end date.
        end: String,
    },
    /// The submission window is locked for this date.
    WindowLocked {
        /// The date a write was attempted for.
        date: String,
    },
    /// The date falls outside the configured submission window.
    DateOutsideWindow {
        /// The date a write was attempted for.
        date: String,
    },
    /// A shift entry has no store.
    MissingStoreId,
    /// An allowance name is empty after slugification.
    AllowanceNameRequired,
    /// A document path or id is malformed.
    InvalidDocumentPath(String),
    /// A role name is not recognized.
    InvalidRole(String),
    /// A capability name is not recognized.
    InvalidCapability(String),
    /// An approval kind is not recognized.
    InvalidApprovalKind(String),
    /// The payload kind cannot be fanned out across role documents.
    UntargetedPayload(ApprovalKind),
    /// A shift correction names a document that is not an attendance record.
    NotAttendanceRecord(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTime(msg) => write!(f, "Invalid time: {msg}"),
            Self::InvalidTimeRange { start, end } => {
                write!(f, "Invalid time range: {start}-{end} does not end after it starts")
            }
            Self::InvalidMonthKey(value) => {
                write!(f, "Invalid month key '{value}': expected YYYYMM")
            }
            Self::InvalidDateKey(value) => {
                write!(f, "Invalid date '{value}': expected YYYY-MM-DD")
            }
            Self::DateOutsideMonth { date, month } => {
                write!(f, "Date {date} does not belong to month {month}")
            }
            Self::InvalidTimestamp(value) => write!(f, "Invalid timestamp '{value}'"),
            Self::InvalidWindowRange { start, end } => {
                write!(f, "Submission window ends ({end}) before it starts ({start})")
            }
            Self::WindowLocked { date } => {
                write!(f, "The submission window is locked for {date}")
            }
            Self::DateOutsideWindow { date } => {
                write!(f, "Date {date} is outside the submission window")
            }
            Self::MissingStoreId => write!(f, "A shift entry requires a store"),
            Self::AllowanceNameRequired => write!(f, "An allowance name is required"),
            Self::InvalidDocumentPath(path) => write!(f, "Invalid document path '{path}'"),
            Self::InvalidRole(role) => write!(f, "Invalid role '{role}'"),
            Self::InvalidCapability(name) => write!(f, "Invalid capability '{name}'"),
            Self::InvalidApprovalKind(kind) => write!(f, "Invalid approval type '{kind}'"),
            Self::UntargetedPayload(kind) => {
                write!(f, "Approval type '{kind}' cannot target role documents")
            }
            Self::NotAttendanceRecord(path) => {
                write!(f, "'{path}' is not an attendance record")
            }
        }
    }
}

impl std::error::Error for DomainError {}
