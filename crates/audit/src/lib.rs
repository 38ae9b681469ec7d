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
    clippy::all
)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shiftdesk_domain::{ApprovalKind, ApprovalStatus, Timestamp};

/// Represents the entity performing an action.
///
/// For approval decisions this is the deciding user; `actor_type` records
/// the role they decided with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g. "manager", "admin", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }
}

/// The decision recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// The approval was approved and applied.
    Approve,
    /// The approval was rejected.
    Reject,
}

impl DecisionAction {
    /// The terminal status this action moves an approval to.
    #[must_use]
    pub const fn resulting_status(self) -> ApprovalStatus {
        match self {
            Self::Approve => ApprovalStatus::Approved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        })
    }
}

/// A snapshot of a document at a point in time.
///
/// `Value::Null` stands for "document absent".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// The document body.
    pub data: Value,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    ///
    /// # Arguments
    ///
    /// * `data` - The document body, or `Value::Null` if absent
    #[must_use]
    pub const fn new(data: Value) -> Self {
        Self { data }
    }

    /// A snapshot of an absent document.
    #[must_use]
    pub const fn absent() -> Self {
        Self { data: Value::Null }
    }

    /// Whether the snapshot records an absent document.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.data.is_null()
    }
}

/// An immutable audit record of one approval decision.
///
/// Every successful approve or reject produces exactly one entry. Entries
/// are written once under their own id and never updated, so the log can be
/// replayed independently of the approval record it describes.
///
/// `before` and `after` capture the approval's primary target document
/// around the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalLogEntry {
    /// Log document id.
    pub id: String,
    /// The decided approval.
    pub approval_id: String,
    /// The approval's kind.
    #[serde(rename = "type")]
    pub approval_kind: ApprovalKind,
    /// Approve or reject.
    pub action: DecisionAction,
    /// The deciding actor.
    pub actor: Actor,
    /// Decision comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Batch id, if the approval belongs to a batch.
    #[serde(default)]
    pub batch_id: Option<String>,
    /// The approval's store.
    pub store_id: String,
    /// Target document before the decision.
    #[serde(default)]
    pub before: StateSnapshot,
    /// Target document after the decision.
    #[serde(default)]
    pub after: StateSnapshot,
    /// When the decision was made.
    pub created_at: Timestamp,
}
