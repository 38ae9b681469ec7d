// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for authorization-aware UI gating.
//!
//! Capabilities expose what an actor is permitted to do without leaking
//! domain internals. They are advisory only and do not replace the checks
//! the engines perform.

use shiftdesk_domain::{ApprovalKind, has_capability};

use crate::auth::AuthenticatedActor;
use crate::request_response::{ApprovalCapabilities, Capability};

fn can_decide(actor: &AuthenticatedActor, kind: ApprovalKind) -> Capability {
    Capability::from_bool(has_capability(
        actor.role,
        shiftdesk_domain::Capability::for_approval(kind),
    ))
}

/// Computes approval and submission capabilities for an actor.
///
/// # Arguments
///
/// * `actor` - The authenticated actor, with its effective role resolved
#[must_use]
pub fn compute_approval_capabilities(actor: &AuthenticatedActor) -> ApprovalCapabilities {
    ApprovalCapabilities {
        can_approve_shift_correction: can_decide(actor, ApprovalKind::ShiftCorrection),
        can_approve_receipt: can_decide(actor, ApprovalKind::Receipt),
        can_approve_store_membership: can_decide(actor, ApprovalKind::StoreMembership),
        can_approve_employment_change: can_decide(actor, ApprovalKind::EmploymentChange),
        can_approve_allowance_add: can_decide(actor, ApprovalKind::AllowanceAdd),
        can_approve_allowance_update: can_decide(actor, ApprovalKind::AllowanceUpdate),
        can_approve_allowance_end: can_decide(actor, ApprovalKind::AllowanceEnd),
        can_approve_commute_update: can_decide(actor, ApprovalKind::CommuteUpdate),
        can_submit_proxy: Capability::from_bool(has_capability(
            actor.role,
            shiftdesk_domain::Capability::ProxySubmit,
        )),
        can_submit_shift_request: Capability::from_bool(has_capability(
            actor.role,
            shiftdesk_domain::Capability::SubmitShiftRequest,
        )),
    }
}
