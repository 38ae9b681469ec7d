// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-day optimistic sync state.
//!
//! A [`DayBook`] holds one [`DayState`] per date of a month. The book is a
//! pure state machine: callers drive it around their own reads and writes.
//!
//! ```text
//! Unloaded -> Loading -> Loaded <-> Pending
//!                 \-> Error -> Loading
//! ```
//!
//! ## Invariants
//!
//! - A `Pending` day keeps its local entries until the save resolves;
//!   reconciliation never overwrites them
//! - A failed save restores the exact pre-save entries
//! - The newest snapshot seen while `Pending` is held and wins over the
//!   save's own content when its version is higher
//! - Snapshots older than the last confirmed version are ignored
//! - Saving entries equal to the current entries is a no-op

use crate::document::WriteOp;
use crate::error::CoreError;
use serde_json::Value;
use shiftdesk_domain::{
    DateKey, DayRequest, DocPath, MonthKey, ShiftEntry, Timestamp, merge_entries,
};
use std::collections::BTreeMap;

/// Lifecycle phase of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    /// Never read.
    Unloaded,
    /// A read is in flight.
    Loading,
    /// Entries reflect the store, possibly empty.
    Loaded,
    /// A local write is in flight; entries reflect local intent.
    Pending,
    /// The last read failed.
    Error,
}

/// A day's remote content as read or observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDay {
    /// Stored entries; empty when the document is absent.
    pub entries: Vec<ShiftEntry>,
    /// Stored `updatedAt`.
    pub updated_at: Option<Timestamp>,
    /// Commit sequence that produced this content.
    pub version: Option<u64>,
}

impl RemoteDay {
    /// Content of a day with no document.
    #[must_use]
    pub const fn absent(version: Option<u64>) -> Self {
        Self {
            entries: Vec::new(),
            updated_at: None,
            version,
        }
    }

    /// Content of a stored day document.
    #[must_use]
    pub fn from_request(request: DayRequest, version: u64) -> Self {
        Self {
            entries: request.entries,
            updated_at: request.updated_at,
            version: Some(version),
        }
    }
}

/// Local state of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayState {
    /// The date.
    pub date: DateKey,
    /// Entries as currently shown.
    pub entries: Vec<ShiftEntry>,
    /// Lifecycle phase.
    pub phase: DayPhase,
    /// Last error for this day.
    pub error: Option<String>,
    /// `updatedAt` of the content shown.
    pub updated_at: Option<Timestamp>,
    /// Highest commit sequence this client has accepted for the day.
    pub version: Option<u64>,
    rollback: Option<(Vec<ShiftEntry>, Option<Timestamp>)>,
    held: Option<RemoteDay>,
}

impl DayState {
    /// A day that has never been read.
    #[must_use]
    pub const fn unloaded(date: DateKey) -> Self {
        Self {
            date,
            entries: Vec::new(),
            phase: DayPhase::Unloaded,
            error: None,
            updated_at: None,
            version: None,
            rollback: None,
            held: None,
        }
    }

    /// Whether a read is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == DayPhase::Loading
    }

    /// Whether a local write is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.phase == DayPhase::Pending
    }

    fn accept(&mut self, remote: RemoteDay) {
        self.entries = remote.entries;
        self.updated_at = remote.updated_at;
        self.version = self.version.max(remote.version);
        self.phase = DayPhase::Loaded;
        self.error = None;
    }

    fn hold(&mut self, remote: RemoteDay) {
        let newer: bool = match &self.held {
            Some(held) => remote.version > held.version,
            None => true,
        };
        if newer {
            self.held = Some(remote);
        }
    }

    fn is_older_than_confirmed(&self, remote: &RemoteDay) -> bool {
        matches!((remote.version, self.version), (Some(incoming), Some(known)) if incoming < known)
    }
}

/// What a save needs to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavePlan {
    /// The normalized entries equal the current ones; nothing to write.
    Unchanged,
    /// Write the normalized entries. The day is now `Pending`.
    Persist {
        /// Normalized entries to store; empty means delete.
        entries: Vec<ShiftEntry>,
    },
}

/// Result of reconciling an observed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Local state now matches the snapshot.
    Applied,
    /// The day has a write in flight; the snapshot was ignored.
    IgnoredPending,
    /// The snapshot predates content already accepted; ignored.
    IgnoredStale,
    /// Content already matched; only the version advanced.
    Unchanged,
}

/// Per-day state for one user's month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBook {
    user_id: String,
    month: MonthKey,
    days: BTreeMap<DateKey, DayState>,
    last_error: Option<String>,
}

impl DayBook {
    /// Creates an empty book.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owning user
    /// * `month` - The month the book covers
    #[must_use]
    pub const fn new(user_id: String, month: MonthKey) -> Self {
        Self {
            user_id,
            month,
            days: BTreeMap::new(),
            last_error: None,
        }
    }

    /// The owning user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The month.
    #[must_use]
    pub const fn month(&self) -> MonthKey {
        self.month
    }

    /// The state of `date`, if it has been touched.
    #[must_use]
    pub fn day(&self, date: DateKey) -> Option<&DayState> {
        self.days.get(&date)
    }

    /// All touched days in date order.
    pub fn days(&self) -> impl Iterator<Item = &DayState> {
        self.days.values()
    }

    /// Whether any day has a write in flight.
    #[must_use]
    pub fn any_pending(&self) -> bool {
        self.days.values().any(DayState::is_pending)
    }

    /// The most recent save error across all days.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn entry(&mut self, date: DateKey) -> Result<&mut DayState, CoreError> {
        if !self.month.contains(date) {
            return Err(CoreError::DomainViolation(
                shiftdesk_domain::DomainError::DateOutsideMonth {
                    date: date.to_string(),
                    month: self.month.to_string(),
                },
            ));
        }
        Ok(self
            .days
            .entry(date)
            .or_insert_with(|| DayState::unloaded(date)))
    }

    /// Marks `date` as loading.
    ///
    /// A pending day stays pending.
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is not in the book's month.
    pub fn begin_load(&mut self, date: DateKey) -> Result<(), CoreError> {
        let day: &mut DayState = self.entry(date)?;
        if !day.is_pending() {
            day.phase = DayPhase::Loading;
        }
        Ok(())
    }

    /// Records a completed read.
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is not in the book's month.
    pub fn finish_load(&mut self, date: DateKey, remote: RemoteDay) -> Result<(), CoreError> {
        let day: &mut DayState = self.entry(date)?;
        if day.is_pending() {
            day.hold(remote);
            return Ok(());
        }
        if day.is_older_than_confirmed(&remote) {
            return Ok(());
        }
        day.accept(remote);
        Ok(())
    }

    /// Records a failed read.
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is not in the book's month.
    pub fn fail_load(&mut self, date: DateKey, message: String) -> Result<(), CoreError> {
        let day: &mut DayState = self.entry(date)?;
        if !day.is_pending() {
            day.phase = DayPhase::Error;
        }
        day.error = Some(message);
        Ok(())
    }

    /// Starts a save of `next` for `date`.
    ///
    /// Normalizes `next`; if it equals the current entries nothing changes.
    /// Otherwise the day becomes `Pending` showing the normalized entries and
    /// remembers the prior entries for rollback.
    ///
    /// # Errors
    ///
    /// Returns an error if the day is not loaded, already has a save in
    /// flight, or `date` is outside the month.
    pub fn begin_save(&mut self, date: DateKey, next: &[ShiftEntry]) -> Result<SavePlan, CoreError> {
        let day: &mut DayState = self.entry(date)?;
        match day.phase {
            DayPhase::Loaded => {}
            DayPhase::Pending => {
                return Err(CoreError::SaveInFlight {
                    date: date.to_string(),
                });
            }
            DayPhase::Unloaded | DayPhase::Loading | DayPhase::Error => {
                return Err(CoreError::DayNotLoaded {
                    date: date.to_string(),
                });
            }
        }

        let normalized: Vec<ShiftEntry> = merge_entries(next);
        if normalized == day.entries {
            return Ok(SavePlan::Unchanged);
        }

        let previous: Vec<ShiftEntry> = std::mem::replace(&mut day.entries, normalized.clone());
        day.rollback = Some((previous, day.updated_at));
        day.phase = DayPhase::Pending;
        day.error = None;
        Ok(SavePlan::Persist {
            entries: normalized,
        })
    }

    /// Confirms the in-flight save of `date`.
    ///
    /// A snapshot held while pending replaces the saved content when its
    /// version is above `version`.
    ///
    /// # Arguments
    ///
    /// * `date` - The saved date
    /// * `version` - Commit sequence of the write
    /// * `updated_at` - Stored `updatedAt`; `None` for a deletion
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is outside the month.
    pub fn confirm_save(
        &mut self,
        date: DateKey,
        version: u64,
        updated_at: Option<Timestamp>,
    ) -> Result<(), CoreError> {
        let day: &mut DayState = self.entry(date)?;
        if !day.is_pending() {
            return Ok(());
        }
        day.rollback = None;
        day.updated_at = updated_at;
        day.version = day.version.max(Some(version));
        day.phase = DayPhase::Loaded;
        if let Some(held) = day.held.take().filter(|held| held.version > Some(version)) {
            day.accept(held);
        }
        Ok(())
    }

    /// Rolls back the in-flight save of `date` after a failure.
    ///
    /// A snapshot held while pending is applied over the restored entries
    /// unless it is older than the confirmed version.
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is outside the month.
    pub fn rollback_save(&mut self, date: DateKey, message: String) -> Result<(), CoreError> {
        let day: &mut DayState = self.entry(date)?;
        if let Some((entries, updated_at)) = day.rollback.take() {
            day.entries = entries;
            day.updated_at = updated_at;
        }
        if day.is_pending() {
            day.phase = DayPhase::Loaded;
        }
        if let Some(held) = day.held.take() {
            if !day.is_older_than_confirmed(&held) {
                day.accept(held);
            }
        }
        day.error = Some(message.clone());
        self.last_error = Some(message);
        Ok(())
    }

    /// Reconciles a snapshot observed on the month's change feed.
    ///
    /// # Errors
    ///
    /// Returns an error if `date` is outside the month.
    pub fn reconcile(
        &mut self,
        date: DateKey,
        remote: RemoteDay,
    ) -> Result<ReconcileOutcome, CoreError> {
        let day: &mut DayState = self.entry(date)?;
        if day.is_pending() {
            day.hold(remote);
            return Ok(ReconcileOutcome::IgnoredPending);
        }
        if day.is_older_than_confirmed(&remote) {
            return Ok(ReconcileOutcome::IgnoredStale);
        }
        if day.phase == DayPhase::Loaded && day.entries == remote.entries {
            day.version = day.version.max(remote.version);
            day.updated_at = remote.updated_at;
            return Ok(ReconcileOutcome::Unchanged);
        }
        day.accept(remote);
        Ok(ReconcileOutcome::Applied)
    }
}

/// The write that stores `entries` for a day.
///
/// An empty list deletes the document rather than storing an empty array.
///
/// # Errors
///
/// Returns an error if the path cannot be built or the request does not
/// serialize.
pub fn day_write(
    user_id: &str,
    month: MonthKey,
    date: DateKey,
    entries: Vec<ShiftEntry>,
    now: Timestamp,
) -> Result<WriteOp, CoreError> {
    let path: DocPath = DocPath::day_request(user_id, month, date)?;
    if entries.is_empty() {
        return Ok(WriteOp::Delete { path });
    }
    let request: DayRequest = DayRequest {
        user_id: user_id.to_string(),
        date,
        entries,
        updated_at: Some(now),
    };
    let data: Value = serde_json::to_value(&request).map_err(|err| CoreError::MalformedDocument {
        path: path.to_string(),
        reason: err.to_string(),
    })?;
    Ok(WriteOp::Set { path, data })
}
