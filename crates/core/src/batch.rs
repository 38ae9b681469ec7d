// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::approval::target_paths;
use crate::document::{WriteBatch, WriteOp};
use crate::error::CoreError;
use serde_json::Value;
use shiftdesk_audit::DecisionAction;
use shiftdesk_domain::{
    ApprovalPayload, ApprovalStatus, ApprovalSummary, BatchContext, DocPath, DocRef, Timestamp,
    collections,
};

/// One resolved target of a proxy submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTarget {
    /// The target user.
    pub user_id: String,
    /// The target role document id.
    pub role_doc_id: String,
}

/// Everything needed to fan one proxy submission out into approvals.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    /// The store the approvals belong to.
    pub store_id: String,
    /// Resolved targets, in submission order.
    pub targets: Vec<BatchTarget>,
    /// The shared payload template.
    pub payload: ApprovalPayload,
    /// The submitting user.
    pub submitted_by: String,
    /// Submission instant, stamped on every approval.
    pub submitted_at: Timestamp,
    /// Title; the kind's label when absent.
    pub title: Option<String>,
    /// Whether deciding requires a comment.
    pub comment_required: bool,
}

/// A planned batch: the approvals and the write that creates them.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    /// The shared batch id.
    pub batch_id: String,
    /// One approval per target, in target order.
    pub approvals: Vec<ApprovalSummary>,
    /// Creates every approval or none.
    pub batch: WriteBatch,
}

/// Plans a batch of approvals sharing `batch_id`.
///
/// `approval_ids` supplies one fresh id per target.
///
/// # Errors
///
/// Returns an error if there are no targets, the ids do not match the
/// targets one for one, the payload kind does not target role records, or an
/// approval could never be approved (for example `ALLOWANCE_NAME_REQUIRED`).
pub fn plan_batch(
    request: &BatchRequest,
    batch_id: &str,
    approval_ids: &[String],
) -> Result<BatchPlan, CoreError> {
    if request.targets.is_empty() {
        return Err(CoreError::EmptyBatch);
    }
    if approval_ids.len() != request.targets.len() {
        return Err(CoreError::MalformedDocument {
            path: format!("{}/{batch_id}", collections::APPROVALS),
            reason: format!(
                "{} ids for {} targets",
                approval_ids.len(),
                request.targets.len()
            ),
        });
    }
    let count: u32 = u32::try_from(request.targets.len()).map_err(|_| CoreError::EmptyBatch)?;
    let title: String = request
        .title
        .clone()
        .unwrap_or_else(|| request.payload.kind().label().to_string());

    let mut approvals: Vec<ApprovalSummary> = Vec::with_capacity(request.targets.len());
    let mut batch: WriteBatch = WriteBatch::new();
    for ((index, target), id) in (0..count).zip(&request.targets).zip(approval_ids) {
        let payload: ApprovalPayload = request
            .payload
            .with_target(&target.user_id, &target.role_doc_id)?;
        let approval: ApprovalSummary = ApprovalSummary {
            id: id.clone(),
            store_id: request.store_id.clone(),
            kind: payload.kind(),
            status: ApprovalStatus::Pending,
            title: title.clone(),
            submitted_by: request.submitted_by.clone(),
            submitted_at: Some(request.submitted_at),
            comment_required: request.comment_required,
            payload,
            target: Some(DocRef {
                col: collections::USER_STORE_ROLES.to_string(),
                id: target.role_doc_id.clone(),
            }),
            batch_context: Some(BatchContext {
                id: batch_id.to_string(),
                index,
                count,
            }),
            decided_by: None,
            decided_at: None,
            comment: None,
        };
        target_paths(&approval, DecisionAction::Approve)?;
        let path: DocPath = DocPath::approval(id)?;
        let data: Value =
            serde_json::to_value(&approval).map_err(|err| CoreError::MalformedDocument {
                path: path.to_string(),
                reason: err.to_string(),
            })?;
        batch = batch
            .require(path.clone(), None)
            .write(WriteOp::Set { path, data });
        approvals.push(approval);
    }

    Ok(BatchPlan {
        batch_id: batch_id.to_string(),
        approvals,
        batch,
    })
}

/// How a bulk selection is grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every selected approval belongs to this batch.
    Batch(String),
    /// No selected approval belongs to a batch.
    Unbatched,
}

/// Classifies a bulk selection.
///
/// # Errors
///
/// Returns `EmptySelection` for an empty selection and `MixedBatch` when the
/// selection spans two batches or mixes batched and unbatched approvals.
pub fn classify_selection(approvals: &[ApprovalSummary]) -> Result<Selection, CoreError> {
    let mut ids = approvals.iter().map(ApprovalSummary::batch_id);
    let first: Option<&str> = ids.next().ok_or(CoreError::EmptySelection)?;
    if ids.any(|id| id != first) {
        return Err(CoreError::MixedBatch);
    }
    Ok(first.map_or(Selection::Unbatched, |id| Selection::Batch(id.to_string())))
}
