// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Allowance assignments and their name-based document keys.
//!
//! Allowance identity is the pair (role document, slugified name), so add,
//! update and end approvals for the same name on the same role always land
//! on one document.

use crate::calendar::{DateKey, Timestamp};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Lifecycle of an allowance assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowanceStatus {
    /// Currently paid.
    Active,
    /// Soft-closed; never hard-deleted.
    Ended,
}

/// An allowance paid to a user at a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceAssignment {
    /// Deterministic id, see [`allowance_doc_id`].
    pub id: String,
    /// The store.
    pub store_id: String,
    /// The role record the allowance hangs off.
    pub role_doc_id: String,
    /// The user.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: AllowanceStatus,
    /// Allowance master this assignment was created from.
    #[serde(default)]
    pub master_id: Option<String>,
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: Option<i64>,
    /// Whether the allowance is tax exempt.
    #[serde(default)]
    pub tax_exempt: Option<bool>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// First date paid.
    #[serde(default)]
    pub effective_from: Option<DateKey>,
    /// Last date paid.
    #[serde(default)]
    pub effective_to: Option<DateKey>,
    /// Staleness fence for approvals.
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Lowercases `name`, collapses every run of non-alphanumeric characters to
/// one hyphen and trims leading and trailing hyphens.
///
/// Alphanumeric is Unicode-aware, so non-Latin names keep their letters.
#[must_use]
pub fn slugify_allowance_name(name: &str) -> String {
    let mut slug: String = String::with_capacity(name.len());
    let mut pending_hyphen: bool = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Document id for the allowance `name` on `role_doc_id`.
///
/// # Errors
///
/// Returns `AllowanceNameRequired` if the name slugifies to nothing.
pub fn allowance_doc_id(role_doc_id: &str, name: &str) -> Result<String, DomainError> {
    let slug: String = slugify_allowance_name(name);
    if slug.is_empty() {
        return Err(DomainError::AllowanceNameRequired);
    }
    Ok(format!("{role_doc_id}__{slug}"))
}
