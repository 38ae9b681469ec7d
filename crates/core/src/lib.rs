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

mod approval;
mod batch;
mod day_sync;
mod document;
mod error;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use approval::{Decision, DecisionTransition, apply_decision, is_stale, target_paths};
pub use batch::{BatchPlan, BatchRequest, BatchTarget, Selection, classify_selection, plan_batch};
pub use day_sync::{
    DayBook, DayPhase, DayState, ReconcileOutcome, RemoteDay, SavePlan, day_write,
};
pub use document::{
    Document, Precondition, ReadSet, WriteBatch, WriteOp, merge_fields, to_fields,
};
pub use error::CoreError;
