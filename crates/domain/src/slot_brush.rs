// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only slot preview of a day's entries.
//!
//! The grid is lossy: an entry covering any part of a slot paints the whole
//! slot. Later entries paint over earlier ones.

use crate::entry::ShiftEntry;
use serde::{Deserialize, Serialize};

/// Width of one slot in minutes.
pub const SLOT_MINUTES: u16 = 30;

/// Number of slots in a day.
pub const SLOTS_PER_DAY: usize = 48;

/// A day divided into fixed-width slots, each tagged with a store id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    slots: Vec<Option<String>>,
}

impl SlotGrid {
    /// An empty grid.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: vec![None; SLOTS_PER_DAY],
        }
    }

    /// All slots in order, starting at `00:00`.
    #[must_use]
    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    /// The store covering slot `index`, if any.
    #[must_use]
    pub fn store_at(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(Option::as_deref)
    }

    /// Number of painted slots.
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self::empty()
    }
}

/// Paints `entries` onto a fresh grid.
///
/// Entries that do not end after they start are skipped.
#[must_use]
pub fn paint_slots(entries: &[ShiftEntry]) -> SlotGrid {
    let mut grid: SlotGrid = SlotGrid::empty();
    for entry in entries {
        let Ok(span) = entry.span() else {
            continue;
        };
        for (index, slot) in grid.slots.iter_mut().enumerate() {
            let slot_start: u16 = u16::try_from(index).unwrap_or(u16::MAX) * SLOT_MINUTES;
            let slot_end: u16 = slot_start + SLOT_MINUTES;
            if span.start.minutes() < slot_end && span.end.minutes() > slot_start {
                *slot = Some(entry.store_id.clone());
            }
        }
    }
    grid
}
