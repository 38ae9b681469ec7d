// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Document paths.
//!
//! A path alternates collection names and document ids, always ending in a
//! document id: `collection/id[/collection/id...]`.

use crate::calendar::{DateKey, MonthKey};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Collection names.
pub mod collections {
    /// Per-user shift request roots.
    pub const SHIFT_REQUESTS: &str = "shiftRequests";
    /// Months below a shift request root.
    pub const MONTHS: &str = "months";
    /// Days below a month.
    pub const DAYS: &str = "days";
    /// Submission windows keyed by month.
    pub const SUBMIT_WINDOWS: &str = "submitWindows";
    /// Approval summaries.
    pub const APPROVALS: &str = "approvals";
    /// Append-only approval audit log.
    pub const APPROVAL_LOGS: &str = "approvalLogs";
    /// Allowance assignments.
    pub const ALLOWANCES: &str = "allowances";
    /// Current role records.
    pub const USER_STORE_ROLES: &str = "userStoreRoles";
    /// Receipts.
    pub const RECEIPTS: &str = "receipts";
    /// Store join requests.
    pub const STORE_JOIN_REQUESTS: &str = "storeJoinRequests";
    /// Shift correction requests.
    pub const SHIFT_CORRECTIONS: &str = "shiftCorrections";
    /// Attendance records, at the top level or below a store.
    pub const ATTENDANCE: &str = "attendance";
}

/// A validated document path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocPath(String);

impl DocPath {
    /// Parses a full document path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has an odd number of segments, fewer than
    /// two, or any empty segment.
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 2
            || segments.len() % 2 != 0
            || segments.iter().any(|segment| segment.trim().is_empty())
        {
            return Err(DomainError::InvalidDocumentPath(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    /// Builds the path of document `id` in top-level `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is empty or contains `/`.
    pub fn new(collection: &str, id: &str) -> Result<Self, DomainError> {
        Self::parse(&format!("{collection}/{id}"))
    }

    /// The full path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The collection path, everything before the final id.
    #[must_use]
    pub fn collection(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(collection, _)| collection)
    }

    /// The document id, the final segment.
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, id)| id)
    }

    /// Whether the document lives directly in `collection`.
    #[must_use]
    pub fn in_collection(&self, collection: &str) -> bool {
        self.collection() == collection
    }

    /// Whether the document sits in an attendance collection, at any depth.
    #[must_use]
    pub fn is_attendance_record(&self) -> bool {
        self.collection().rsplit('/').next() == Some(collections::ATTENDANCE)
    }

    /// `shiftRequests/{user}/months/{month}/days/{date}`.
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is not in `month` or the user id is invalid.
    pub fn day_request(user_id: &str, month: MonthKey, date: DateKey) -> Result<Self, DomainError> {
        if !month.contains(date) {
            return Err(DomainError::DateOutsideMonth {
                date: date.to_string(),
                month: month.to_string(),
            });
        }
        Self::parse(&format!("{}/{date}", Self::day_collection(user_id, month)))
    }

    /// `shiftRequests/{user}/months/{month}/days`, the month's day collection.
    #[must_use]
    pub fn day_collection(user_id: &str, month: MonthKey) -> String {
        format!(
            "{}/{user_id}/{}/{month}/{}",
            collections::SHIFT_REQUESTS,
            collections::MONTHS,
            collections::DAYS
        )
    }

    /// `submitWindows/{month}`.
    ///
    /// # Errors
    ///
    /// Never fails for a valid month key; kept fallible for uniformity.
    pub fn submit_window(month: MonthKey) -> Result<Self, DomainError> {
        Self::new(collections::SUBMIT_WINDOWS, &month.to_string())
    }

    /// `approvals/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn approval(id: &str) -> Result<Self, DomainError> {
        Self::new(collections::APPROVALS, id)
    }

    /// `approvalLogs/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn approval_log(id: &str) -> Result<Self, DomainError> {
        Self::new(collections::APPROVAL_LOGS, id)
    }

    /// `allowances/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn allowance(id: &str) -> Result<Self, DomainError> {
        Self::new(collections::ALLOWANCES, id)
    }

    /// `userStoreRoles/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn user_store_role(role_doc_id: &str) -> Result<Self, DomainError> {
        Self::new(collections::USER_STORE_ROLES, role_doc_id)
    }

    /// `receipts/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn receipt(id: &str) -> Result<Self, DomainError> {
        Self::new(collections::RECEIPTS, id)
    }

    /// `storeJoinRequests/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn join_request(id: &str) -> Result<Self, DomainError> {
        Self::new(collections::STORE_JOIN_REQUESTS, id)
    }

    /// `shiftCorrections/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn shift_correction(id: &str) -> Result<Self, DomainError> {
        Self::new(collections::SHIFT_CORRECTIONS, id)
    }
}

impl TryFrom<String> for DocPath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocPath> for String {
    fn from(value: DocPath) -> Self {
        value.0
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
