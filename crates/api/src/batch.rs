// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Proxy submissions fanned out into batches of approvals.

use shiftdesk::{BatchPlan, BatchRequest, BatchTarget, CoreError, Document, plan_batch};
use shiftdesk_domain::{DocPath, Timestamp, UserStoreRole};
use shiftdesk_persistence::{CommitReceipt, DocumentStore};
use std::sync::Arc;
use tracing::info;

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::request_response::{CreateBatchRequest, CreateBatchResponse};

/// Creates batches of approvals from one proxy submission.
pub struct BatchApprovalCoordinator {
    store: Arc<dyn DocumentStore>,
}

impl BatchApprovalCoordinator {
    /// Creates a coordinator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates one pending approval per target role document.
    ///
    /// Every approval shares one fresh batch id and carries its index and the
    /// batch size. All approvals are written in one commit, so either every
    /// approval exists afterwards or none does.
    ///
    /// # Arguments
    ///
    /// * `request` - Targets and the shared payload
    /// * `requester` - The submitting actor
    ///
    /// # Errors
    ///
    /// Returns an error if the requester may not submit on behalf of others,
    /// there are no targets, a target role document does not exist, the
    /// payload kind does not target role documents, an approval could never
    /// be applied (such as a blank allowance name), or the commit fails.
    pub async fn create_batch_approvals(
        &self,
        request: &CreateBatchRequest,
        requester: &AuthenticatedActor,
    ) -> Result<CreateBatchResponse, ApiError> {
        AuthorizationService::authorize_proxy_submit(requester)?;
        if request.target_role_doc_ids.is_empty() {
            return Err(CoreError::EmptyBatch.into());
        }

        let paths: Vec<DocPath> = request
            .target_role_doc_ids
            .iter()
            .map(|id| DocPath::user_store_role(id))
            .collect::<Result<_, _>>()?;
        let found: Vec<Option<Document>> = self.store.get_many(&paths).await?;

        let mut targets: Vec<BatchTarget> = Vec::with_capacity(found.len());
        for (role_doc_id, document) in request.target_role_doc_ids.iter().zip(found) {
            let document: Document = document.ok_or_else(|| CoreError::MissingRoleDocument {
                role_doc_id: role_doc_id.clone(),
            })?;
            let role: UserStoreRole = document.decode()?;
            targets.push(BatchTarget {
                user_id: role.user_id,
                role_doc_id: role_doc_id.clone(),
            });
        }

        let batch_id: String = format!("batch_{}", rand::random::<u64>());
        let approval_ids: Vec<String> = (0..targets.len())
            .map(|index| format!("{batch_id}_{index}"))
            .collect();
        let plan: BatchPlan = plan_batch(
            &BatchRequest {
                store_id: request.store_id.clone(),
                targets,
                payload: request.payload.clone(),
                submitted_by: requester.id.clone(),
                submitted_at: Timestamp::now(),
                title: request.title.clone(),
                comment_required: request.comment_required,
            },
            &batch_id,
            &approval_ids,
        )?;

        let receipt: CommitReceipt = self.store.commit(plan.batch).await?;
        info!(
            %batch_id,
            store_id = %request.store_id,
            kind = %request.payload.kind(),
            count = plan.approvals.len(),
            version = receipt.version,
            "Created approval batch"
        );

        Ok(CreateBatchResponse {
            batch_id,
            created: plan.approvals.len(),
            approval_ids,
        })
    }
}
