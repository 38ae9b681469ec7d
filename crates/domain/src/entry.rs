// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::calendar::{DateKey, Timestamp};
use crate::error::DomainError;
use crate::time_range::{TimeOfDay, TimeSpan};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One requested shift at a store on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEntry {
    /// The store the shift is requested at.
    pub store_id: String,
    /// Start time of day.
    pub start: TimeOfDay,
    /// End time of day. Always after `start`.
    pub end: TimeOfDay,
    /// Optional free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ShiftEntry {
    /// Creates a validated entry from `HH:MM` strings.
    ///
    /// # Arguments
    ///
    /// * `store_id` - The store the shift is requested at
    /// * `start` - Start time as `HH:MM`
    /// * `end` - End time as `HH:MM`
    /// * `note` - Optional note
    ///
    /// # Errors
    ///
    /// Returns an error if either time is malformed or `start >= end`.
    pub fn new(
        store_id: impl Into<String>,
        start: &str,
        end: &str,
        note: Option<String>,
    ) -> Result<Self, DomainError> {
        let span: TimeSpan =
            TimeSpan::new(TimeOfDay::parse_hhmm(start)?, TimeOfDay::parse_hhmm(end)?)?;
        Ok(Self::from_span(store_id, span, note))
    }

    /// Creates an entry from an already validated span.
    #[must_use]
    pub fn from_span(store_id: impl Into<String>, span: TimeSpan, note: Option<String>) -> Self {
        Self {
            store_id: store_id.into(),
            start: span.start,
            end: span.end,
            note,
        }
    }

    /// Returns the entry's span.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not end after it starts, which can
    /// only happen for entries deserialized from untrusted input.
    pub fn span(&self) -> Result<TimeSpan, DomainError> {
        TimeSpan::new(self.start, self.end)
    }

    /// Validates the entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store id is blank or the span is invalid.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.store_id.trim().is_empty() {
            return Err(DomainError::MissingStoreId);
        }
        self.span().map(|_| ())
    }
}

/// Builds one entry per span, all at `store_id`.
#[must_use]
pub fn entries_from_spans(store_id: &str, spans: &[TimeSpan]) -> Vec<ShiftEntry> {
    spans
        .iter()
        .map(|span| ShiftEntry::from_span(store_id, *span, None))
        .collect()
}

/// Removes exact duplicate entries, keeping the first occurrence of each.
///
/// Overlapping entries that differ in store or note are kept as they are.
/// The function is idempotent.
#[must_use]
pub fn merge_entries(entries: &[ShiftEntry]) -> Vec<ShiftEntry> {
    let mut seen: HashSet<&ShiftEntry> = HashSet::with_capacity(entries.len());
    entries
        .iter()
        .filter(|entry| seen.insert(*entry))
        .cloned()
        .collect()
}

/// The persisted entry list for one user on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRequest {
    /// The owning user.
    pub user_id: String,
    /// The calendar date.
    pub date: DateKey,
    /// The requested shifts.
    #[serde(default)]
    pub entries: Vec<ShiftEntry>,
    /// When the document was last written.
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}
