// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::calendar::{DateKey, Timestamp};
use crate::capability::Role;
use serde::{Deserialize, Serialize};

/// Document id of a user's role record at a store.
#[must_use]
pub fn role_doc_id(user_id: &str, store_id: &str) -> String {
    format!("{user_id}_{store_id}")
}

/// Employment terms held on a role record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentTerms {
    /// Employment type, e.g. `part_time`.
    #[serde(rename = "type", default)]
    pub employment_type: Option<String>,
    /// Base pay rate in minor currency units.
    #[serde(default)]
    pub base_rate: Option<i64>,
    /// Contracted hours.
    #[serde(default)]
    pub base_hours: Option<f64>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// Date the terms take effect.
    #[serde(default)]
    pub effective_from: Option<DateKey>,
}

/// How commuting costs are reimbursed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommuteMode {
    /// Reimburse actual cost per commute.
    Actual,
    /// Fixed amount.
    Fixed,
}

impl CommuteMode {
    /// Parses a mode, mapping anything unrecognized to `None`.
    #[must_use]
    pub fn parse_lenient(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            Some("actual") => Some(Self::Actual),
            Some("fixed") => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// The commute policy held on a role record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommutePolicy {
    /// Reimbursement mode; `null` when unset or unrecognized.
    #[serde(default)]
    pub mode: Option<CommuteMode>,
    /// Amount per commute or fixed amount.
    #[serde(default)]
    pub unit_amount: Option<i64>,
    /// Monthly cap.
    #[serde(default)]
    pub monthly_cap: Option<i64>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

/// The commute policy as submitted, before mode normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommuteRequest {
    /// Requested mode as typed by the submitter.
    #[serde(default)]
    pub mode: Option<String>,
    /// Amount per commute or fixed amount.
    #[serde(default)]
    pub unit_amount: Option<i64>,
    /// Monthly cap.
    #[serde(default)]
    pub monthly_cap: Option<i64>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl CommuteRequest {
    /// Normalizes into a stored policy. Unknown modes become `None`.
    #[must_use]
    pub fn to_policy(&self) -> CommutePolicy {
        CommutePolicy {
            mode: CommuteMode::parse_lenient(self.mode.as_deref()),
            unit_amount: self.unit_amount,
            monthly_cap: self.monthly_cap,
            note: self.note.clone(),
        }
    }
}

/// A user's current record at a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStoreRole {
    /// The user.
    pub user_id: String,
    /// The store.
    pub store_id: String,
    /// The user's role at the store.
    pub role: Role,
    /// Whether the user has left the store.
    #[serde(default)]
    pub is_resigned: bool,
    /// Current employment terms.
    #[serde(default)]
    pub employment: Option<EmploymentTerms>,
    /// Current commute policy.
    #[serde(default)]
    pub commute: Option<CommutePolicy>,
    /// Staleness fence for approvals.
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl UserStoreRole {
    /// The record's document id.
    #[must_use]
    pub fn doc_id(&self) -> String {
        role_doc_id(&self.user_id, &self.store_id)
    }
}
