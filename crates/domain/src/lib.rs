// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod allowance;
mod approval;
mod calendar;
mod capability;
mod entry;
mod error;
mod paths;
mod shift_window;
mod slot_brush;
mod store_role;
mod time_range;

#[cfg(test)]
mod tests;

pub use allowance::{
    AllowanceAssignment, AllowanceStatus, allowance_doc_id, slugify_allowance_name,
};
pub use approval::{
    AllowanceChangePayload, ApprovalKind, ApprovalPayload, ApprovalStatus, ApprovalSummary,
    BatchContext, CommuteUpdatePayload, DocRef, EmploymentChangePayload, ReceiptPayload,
    ShiftCorrectionPayload, StoreMembershipPayload,
};
pub use calendar::{DateKey, MonthKey, Timestamp};
pub use capability::{
    Capability, Role, has_capability, has_named_capability, resolve_effective_role,
};
pub use entry::{DayRequest, ShiftEntry, entries_from_spans, merge_entries};
pub use error::DomainError;
pub use paths::{DocPath, collections};
pub use shift_window::{ShiftWindow, WindowState};
pub use slot_brush::{SLOT_MINUTES, SLOTS_PER_DAY, SlotGrid, paint_slots};
pub use store_role::{
    CommuteMode, CommutePolicy, CommuteRequest, EmploymentTerms, UserStoreRole, role_doc_id,
};
pub use time_range::{SpanParseResult, TimeOfDay, TimeSpan, parse_span_input};
