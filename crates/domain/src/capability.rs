// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Rank-based capability gate.
//!
//! Roles are totally ordered by rank. Each capability names the minimum
//! rank that holds it. The gate is pure; callers decide which stored role
//! applies before asking.

use crate::approval::ApprovalKind;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A user's role at a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shared terminal account.
    Kiosk,
    /// Regular staff.
    Staff,
    /// Contracted employee.
    Employee,
    /// Senior staff, may submit on behalf of others.
    Senior,
    /// Store manager.
    Manager,
    /// Administrator.
    Admin,
    /// Owner.
    Owner,
}

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Self; 7] = [
        Self::Kiosk,
        Self::Staff,
        Self::Employee,
        Self::Senior,
        Self::Manager,
        Self::Admin,
        Self::Owner,
    ];

    /// The role's rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Kiosk => 0,
            Self::Staff => 1,
            Self::Employee => 2,
            Self::Senior => 3,
            Self::Manager => 4,
            Self::Admin => 5,
            Self::Owner => 6,
        }
    }

    /// The stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kiosk => "kiosk",
            Self::Staff => "staff",
            Self::Employee => "employee",
            Self::Senior => "senior",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::InvalidRole(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Submit one's own shift requests.
    SubmitShiftRequest,
    /// Submit change requests on behalf of others.
    ProxySubmit,
    /// Decide shift corrections.
    ApproveAttendance,
    /// Decide receipts.
    ApproveReceipt,
    /// Decide store membership requests.
    ApproveMembership,
    /// Decide employment changes.
    ApproveEmployment,
    /// Decide allowance changes.
    ApproveAllowance,
    /// Decide commute policy changes.
    ApproveCommute,
    /// Configure submission windows.
    ManageSubmitWindow,
}

impl Capability {
    /// Every capability.
    pub const ALL: [Self; 9] = [
        Self::SubmitShiftRequest,
        Self::ProxySubmit,
        Self::ApproveAttendance,
        Self::ApproveReceipt,
        Self::ApproveMembership,
        Self::ApproveEmployment,
        Self::ApproveAllowance,
        Self::ApproveCommute,
        Self::ManageSubmitWindow,
    ];

    /// The lowest role holding this capability.
    #[must_use]
    pub const fn minimum_role(self) -> Role {
        match self {
            Self::SubmitShiftRequest => Role::Staff,
            Self::ProxySubmit => Role::Senior,
            Self::ApproveAttendance
            | Self::ApproveReceipt
            | Self::ApproveMembership
            | Self::ApproveCommute => Role::Manager,
            Self::ApproveEmployment | Self::ApproveAllowance | Self::ManageSubmitWindow => {
                Role::Admin
            }
        }
    }

    /// The capability required to decide an approval of `kind`.
    #[must_use]
    pub const fn for_approval(kind: ApprovalKind) -> Self {
        match kind {
            ApprovalKind::ShiftCorrection => Self::ApproveAttendance,
            ApprovalKind::Receipt => Self::ApproveReceipt,
            ApprovalKind::StoreMembership => Self::ApproveMembership,
            ApprovalKind::EmploymentChange => Self::ApproveEmployment,
            ApprovalKind::AllowanceAdd
            | ApprovalKind::AllowanceUpdate
            | ApprovalKind::AllowanceEnd => Self::ApproveAllowance,
            ApprovalKind::CommuteUpdate => Self::ApproveCommute,
        }
    }

    /// The capability's name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubmitShiftRequest => "submit_shift_request",
            Self::ProxySubmit => "proxy_submit",
            Self::ApproveAttendance => "approve_attendance",
            Self::ApproveReceipt => "approve_receipt",
            Self::ApproveMembership => "approve_membership",
            Self::ApproveEmployment => "approve_employment",
            Self::ApproveAllowance => "approve_allowance",
            Self::ApproveCommute => "approve_commute",
            Self::ManageSubmitWindow => "manage_submit_window",
        }
    }
}

impl FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.as_str() == s)
            .ok_or_else(|| DomainError::InvalidCapability(s.to_string()))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `role` holds `capability`.
#[must_use]
pub const fn has_capability(role: Role, capability: Capability) -> bool {
    role.rank() >= capability.minimum_role().rank()
}

/// String form of [`has_capability`].
///
/// Unknown role or capability names hold nothing.
#[must_use]
pub fn has_named_capability(role: &str, capability: &str) -> bool {
    match (role.parse::<Role>(), capability.parse::<Capability>()) {
        (Ok(role), Ok(capability)) => has_capability(role, capability),
        _ => false,
    }
}

/// Resolves the role to gate with.
///
/// The store-specific role wins when present; otherwise the highest role the
/// user holds at any store. `None` when the user holds no role at all.
#[must_use]
pub fn resolve_effective_role(store_role: Option<Role>, all_roles: &[Role]) -> Option<Role> {
    store_role.or_else(|| all_roles.iter().copied().max())
}
