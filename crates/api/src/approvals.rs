// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Approval decisions.
//!
//! Each decision is one read-apply-commit cycle. The commit is guarded by
//! the versions of every document read, so a concurrent change to the
//! approval or its target makes the commit fail and the cycle restart from
//! fresh reads.

use shiftdesk::{
    Decision, DecisionTransition, Document, ReadSet, Selection, apply_decision,
    classify_selection, target_paths,
};
use shiftdesk_audit::{ApprovalLogEntry, DecisionAction};
use shiftdesk_domain::{ApprovalSummary, DocPath, Timestamp, collections};
use shiftdesk_persistence::{DocumentStore, PersistenceError};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::request_response::{BulkDecisionResponse, BulkOutcome, ErrorBody};

/// Default number of read-apply-commit attempts per decision.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Who decides, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionInput {
    /// The deciding actor.
    pub actor: AuthenticatedActor,
    /// Optional comment; required when the approval says so.
    pub comment: Option<String>,
}

impl DecisionInput {
    /// Creates decision input.
    #[must_use]
    pub const fn new(actor: AuthenticatedActor, comment: Option<String>) -> Self {
        Self { actor, comment }
    }
}

/// Approves and rejects approvals.
pub struct ApprovalEngine {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl ApprovalEngine {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets how many times a contended decision is attempted. At least one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Approves `approval_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor may not decide this kind, the approval
    /// is not pending, a required comment is missing, a target is missing or
    /// stale, or the store fails.
    pub async fn approve_approval(
        &self,
        approval_id: &str,
        input: &DecisionInput,
    ) -> Result<ApprovalSummary, ApiError> {
        self.decide(approval_id, DecisionAction::Approve, input)
            .await
    }

    /// Rejects `approval_id`.
    ///
    /// # Errors
    ///
    /// As for [`Self::approve_approval`].
    pub async fn reject_approval(
        &self,
        approval_id: &str,
        input: &DecisionInput,
    ) -> Result<ApprovalSummary, ApiError> {
        self.decide(approval_id, DecisionAction::Reject, input)
            .await
    }

    /// Applies `action` to `approval_id`.
    ///
    /// # Errors
    ///
    /// As for [`Self::approve_approval`]. Fails with `TRANSACTION_CONTENTION`
    /// when every attempt loses a race.
    pub async fn decide(
        &self,
        approval_id: &str,
        action: DecisionAction,
        input: &DecisionInput,
    ) -> Result<ApprovalSummary, ApiError> {
        let path: DocPath = DocPath::approval(approval_id)?;
        let decision: Decision = Decision {
            action,
            actor: input.actor.to_audit_actor(),
            comment: input.comment.clone(),
        };
        let log_id: String = format!("log_{approval_id}_{}", rand::random::<u64>());

        for attempt in 1..=self.max_attempts {
            let (approval, version) = self.read_approval(&path).await?;
            AuthorizationService::authorize_decision(&input.actor, approval.kind)?;

            let targets: Vec<DocPath> = target_paths(&approval, action)?;
            let found: Vec<Option<Document>> = self.store.get_many(&targets).await?;
            let reads: ReadSet = targets.into_iter().zip(found).collect();

            let transition: DecisionTransition = apply_decision(
                &approval,
                version,
                &reads,
                &decision,
                Timestamp::now(),
                &log_id,
            )?;

            match self.store.commit(transition.batch).await {
                Ok(receipt) => {
                    info!(
                        approval_id,
                        kind = %approval.kind,
                        %action,
                        actor = %input.actor.id,
                        version = receipt.version,
                        "Decided approval"
                    );
                    return Ok(transition.decided);
                }
                Err(PersistenceError::Contention { path }) => {
                    debug!(approval_id, attempt, %path, "Decision lost a race; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(approval_id, attempts = self.max_attempts, "Decision gave up under contention");
        Err(ApiError::contention(format!(
            "approval '{approval_id}' kept changing during {} attempts",
            self.max_attempts
        )))
    }

    async fn read_approval(&self, path: &DocPath) -> Result<(ApprovalSummary, u64), ApiError> {
        let document: Document =
            self.store
                .get(path)
                .await?
                .ok_or_else(|| ApiError::ResourceNotFound {
                    code: "NOT_FOUND",
                    message: format!("approval '{}' does not exist", path.id()),
                })?;
        let approval: ApprovalSummary = document.decode()?;
        Ok((approval, document.version))
    }

    /// Applies `action` to every approval in a selection.
    ///
    /// The selection is refused up front if it spans batches or mixes batched
    /// and unbatched approvals. Otherwise each approval is decided on its own;
    /// one failing does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is empty, mixed, names a missing
    /// approval, or cannot be read.
    pub async fn bulk_decide(
        &self,
        approval_ids: &[String],
        action: DecisionAction,
        input: &DecisionInput,
    ) -> Result<BulkDecisionResponse, ApiError> {
        let mut selection: Vec<ApprovalSummary> = Vec::with_capacity(approval_ids.len());
        for id in approval_ids {
            let (approval, _) = self.read_approval(&DocPath::approval(id)?).await?;
            selection.push(approval);
        }
        let batch_id: Option<String> = match classify_selection(&selection)? {
            Selection::Batch(id) => Some(id),
            Selection::Unbatched => None,
        };

        let mut outcomes: Vec<BulkOutcome> = Vec::with_capacity(approval_ids.len());
        for id in approval_ids {
            let outcome: BulkOutcome = match self.decide(id, action, input).await {
                Ok(decided) => BulkOutcome {
                    approval_id: id.clone(),
                    status: Some(decided.status),
                    error: None,
                },
                Err(err) => BulkOutcome {
                    approval_id: id.clone(),
                    status: None,
                    error: Some(ErrorBody::from(&err)),
                },
            };
            outcomes.push(outcome);
        }

        Ok(BulkDecisionResponse { batch_id, outcomes })
    }

    /// Lists the audit entries of one approval, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or an entry is malformed.
    pub async fn approval_logs(&self, approval_id: &str) -> Result<Vec<ApprovalLogEntry>, ApiError> {
        let documents: Vec<Document> = self.store.list(collections::APPROVAL_LOGS).await?;
        let mut entries: Vec<ApprovalLogEntry> = Vec::new();
        for document in documents {
            let entry: ApprovalLogEntry = document.decode()?;
            if entry.approval_id == approval_id {
                entries.push(entry);
            }
        }
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }
}
