// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authenticated actors and capability enforcement.

use shiftdesk_audit::Actor;
use shiftdesk_domain::{ApprovalKind, Capability, Role, has_capability};

use crate::error::AuthError;

/// An authenticated actor with the role that applies in the current store.
///
/// Callers resolve the role (store-specific role if present, else the
/// user's highest role) before building the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The role assigned to this actor.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `role` - The role assigned to this actor
    #[must_use]
    pub const fn new(id: String, role: Role) -> Self {
        Self { id, role }
    }

    /// Converts this authenticated actor into an audit Actor.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.role.as_str().to_string())
    }
}

/// Enforces capability checks.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that `actor` holds `capability`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The authenticated actor
    /// * `capability` - The required capability
    /// * `action` - Name of the attempted action, for the error
    ///
    /// # Errors
    ///
    /// Returns an error if the actor's role ranks below the capability.
    pub fn authorize(
        actor: &AuthenticatedActor,
        capability: Capability,
        action: &str,
    ) -> Result<(), AuthError> {
        if has_capability(actor.role, capability) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: capability.minimum_role().to_string(),
            })
        }
    }

    /// Checks that `actor` may decide approvals of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks the kind's approval capability.
    pub fn authorize_decision(
        actor: &AuthenticatedActor,
        kind: ApprovalKind,
    ) -> Result<(), AuthError> {
        Self::authorize(
            actor,
            Capability::for_approval(kind),
            &format!("decide_{}", kind.as_str()),
        )
    }

    /// Checks that `actor` may submit requests on behalf of others.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks the proxy submission capability.
    pub fn authorize_proxy_submit(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::authorize(actor, Capability::ProxySubmit, "proxy_submit")
    }

    /// Checks that `actor` may edit `user_id`'s shift requests.
    ///
    /// Editing one's own requests needs `submit_shift_request`; editing
    /// someone else's needs `proxy_submit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor's role ranks below the needed capability.
    pub fn authorize_day_write(actor: &AuthenticatedActor, user_id: &str) -> Result<(), AuthError> {
        if actor.id == user_id {
            Self::authorize(actor, Capability::SubmitShiftRequest, "save_day")
        } else {
            Self::authorize(actor, Capability::ProxySubmit, "save_day_for_other")
        }
    }
}
