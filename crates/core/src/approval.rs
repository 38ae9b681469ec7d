// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Approval decisions as pure transitions.
//!
//! A decision is computed from the approval and the documents it touches,
//! read inside one transaction. The result is a [`WriteBatch`] guarded by
//! the versions that were read, so a concurrent change to any written
//! document makes the commit fail instead of overwriting it.
//!
//! ## Invariants
//!
//! - Only pending approvals can be decided
//! - Role-targeted kinds refuse to apply over a target updated after the
//!   approval was submitted
//! - Every decision writes exactly one new audit log entry
//! - Rejections never modify role records or allowances

use crate::document::{Document, ReadSet, WriteBatch, WriteOp, to_fields};
use crate::error::CoreError;
use serde_json::{Map, Value, json};
use shiftdesk_audit::{Actor, ApprovalLogEntry, DecisionAction, StateSnapshot};
use shiftdesk_domain::{
    AllowanceAssignment, AllowanceChangePayload, AllowanceStatus, ApprovalPayload,
    ApprovalSummary, DocPath, DomainError, Role, Timestamp, UserStoreRole, allowance_doc_id,
    collections, role_doc_id,
};

/// A decision to apply to one approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Approve or reject.
    pub action: DecisionAction,
    /// The deciding actor.
    pub actor: Actor,
    /// Optional comment; required when the approval says so.
    pub comment: Option<String>,
}

/// The outcome of a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTransition {
    /// Everything to commit atomically.
    pub batch: WriteBatch,
    /// The approval as stored after the decision.
    pub decided: ApprovalSummary,
    /// The audit log entry written with the decision.
    pub log_entry: ApprovalLogEntry,
}

/// The documents a decision on `approval` reads, besides the approval itself.
///
/// The first path, when present, is the primary target recorded in the audit
/// log. A rejection only needs the documents it stamps, so targets that
/// cannot be resolved are left out instead of failing the rejection.
///
/// # Errors
///
/// Returns an error if an approval target path cannot be built, including
/// `ALLOWANCE_NAME_REQUIRED` for allowance kinds with a blank name and a
/// shift correction whose patch target is not an attendance record.
pub fn target_paths(
    approval: &ApprovalSummary,
    action: DecisionAction,
) -> Result<Vec<DocPath>, CoreError> {
    let approve: bool = action == DecisionAction::Approve;
    let mut paths: Vec<DocPath> = Vec::with_capacity(2);
    match &approval.payload {
        ApprovalPayload::ShiftCorrection(p) => {
            paths.push(DocPath::shift_correction(&p.correction_id)?);
            if approve {
                if !p.attendance_path.is_attendance_record() {
                    return Err(
                        DomainError::NotAttendanceRecord(p.attendance_path.to_string()).into(),
                    );
                }
                paths.push(p.attendance_path.clone());
            }
        }
        ApprovalPayload::Receipt(p) => paths.push(DocPath::receipt(&p.receipt_id)?),
        ApprovalPayload::StoreMembership(p) => {
            paths.push(DocPath::join_request(&p.join_request_id)?);
            if approve {
                paths.push(DocPath::user_store_role(&role_doc_id(
                    &p.user_id,
                    &approval.store_id,
                ))?);
            }
        }
        ApprovalPayload::EmploymentChange(_) | ApprovalPayload::CommuteUpdate(_) => {
            let role = role_path(approval);
            if approve {
                paths.push(role?);
            } else {
                paths.extend(role.ok());
            }
        }
        ApprovalPayload::AllowanceAdd(p)
        | ApprovalPayload::AllowanceUpdate(p)
        | ApprovalPayload::AllowanceEnd(p) => {
            let allowance = allowance_path(approval, p);
            if approve {
                paths.push(allowance?);
            } else {
                paths.extend(allowance.ok());
            }
        }
    }
    Ok(paths)
}

fn role_path(approval: &ApprovalSummary) -> Result<DocPath, CoreError> {
    Ok(DocPath::user_store_role(role_target(approval)?)?)
}

fn allowance_path(
    approval: &ApprovalSummary,
    payload: &AllowanceChangePayload,
) -> Result<DocPath, CoreError> {
    let role: &str = role_target(approval)?;
    Ok(DocPath::allowance(&allowance_doc_id(role, &payload.name)?)?)
}

fn role_target(approval: &ApprovalSummary) -> Result<&str, CoreError> {
    approval
        .payload
        .target_role_doc_id()
        .or_else(|| {
            approval
                .target
                .as_ref()
                .filter(|target| target.col == collections::USER_STORE_ROLES)
                .map(|target| target.id.as_str())
        })
        .ok_or_else(|| CoreError::MissingRoleDocument {
            role_doc_id: String::new(),
        })
}

/// Whether `target_updated_at` is newer than the approval's submission.
///
/// Absent timestamps on either side never conflict.
#[must_use]
pub fn is_stale(target_updated_at: Option<Timestamp>, submitted_at: Option<Timestamp>) -> bool {
    matches!((target_updated_at, submitted_at), (Some(updated), Some(submitted)) if updated > submitted)
}

struct Effects {
    writes: Vec<WriteOp>,
}

impl Effects {
    const fn new() -> Self {
        Self { writes: Vec::new() }
    }

    fn merge(&mut self, path: DocPath, fields: Map<String, Value>) {
        self.writes.push(WriteOp::Merge { path, fields });
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn decision_stamp(decision: &Decision, now: Timestamp, status: &str) -> Map<String, Value> {
    object(json!({
        "status": status,
        "decidedBy": decision.actor.id,
        "decidedAt": now,
        "comment": decision.comment,
    }))
}

fn require<'a>(reads: &'a ReadSet, path: &DocPath) -> Result<&'a Document, CoreError> {
    reads.get(path).ok_or_else(|| CoreError::MissingDocument {
        path: path.to_string(),
    })
}

/// Applies `decision` to `approval`.
///
/// # Arguments
///
/// * `approval` - The approval as read inside the transaction
/// * `approval_version` - The version it was read at
/// * `reads` - The documents named by [`target_paths`], as read
/// * `decision` - The decision
/// * `now` - The decision instant
/// * `log_id` - Id for the new audit log entry
///
/// # Errors
///
/// Returns an error if the approval is not pending, a required comment is
/// missing, a target is missing or stale, or a stored document is malformed.
#[allow(clippy::too_many_lines)]
pub fn apply_decision(
    approval: &ApprovalSummary,
    approval_version: u64,
    reads: &ReadSet,
    decision: &Decision,
    now: Timestamp,
    log_id: &str,
) -> Result<DecisionTransition, CoreError> {
    approval.validate()?;
    if !approval.is_pending() {
        return Err(CoreError::AlreadyDecided {
            approval_id: approval.id.clone(),
            status: approval.status,
        });
    }
    let comment: Option<String> = decision
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from);
    if approval.comment_required && comment.is_none() {
        return Err(CoreError::CommentRequired {
            approval_id: approval.id.clone(),
        });
    }
    let decision: Decision = Decision {
        comment,
        ..decision.clone()
    };

    let targets: Vec<DocPath> = target_paths(approval, decision.action)?;
    let approve: bool = decision.action == DecisionAction::Approve;
    let mut effects: Effects = Effects::new();

    match &approval.payload {
        ApprovalPayload::ShiftCorrection(p) => {
            let correction: &DocPath = &targets[0];
            require(reads, correction)?;
            let status: &str = if approve { "approved" } else { "rejected" };
            effects.merge(correction.clone(), decision_stamp(&decision, now, status));
            if approve && !p.attendance_patch.is_empty() {
                effects.merge(targets[1].clone(), p.attendance_patch.clone());
            }
        }
        ApprovalPayload::Receipt(_) => {
            let receipt: &DocPath = &targets[0];
            require(reads, receipt)?;
            let status: &str = if approve { "locked" } else { "draft" };
            effects.merge(receipt.clone(), decision_stamp(&decision, now, status));
        }
        ApprovalPayload::StoreMembership(p) => {
            let join_request: &DocPath = &targets[0];
            require(reads, join_request)?;
            let status: &str = if approve { "approved" } else { "rejected" };
            effects.merge(join_request.clone(), decision_stamp(&decision, now, status));
            if approve {
                let role: Role = p.role.unwrap_or(Role::Staff);
                effects.merge(
                    targets[1].clone(),
                    object(json!({
                        "userId": p.user_id,
                        "storeId": approval.store_id,
                        "role": role,
                        "isResigned": false,
                        "updatedAt": now,
                    })),
                );
            }
        }
        ApprovalPayload::EmploymentChange(p) => {
            if approve {
                let path: &DocPath = &targets[0];
                check_role_fence(reads, path, approval)?;
                let mut fields: Map<String, Value> = Map::new();
                fields.insert(String::from("employment"), to_value(path, &p.employment)?);
                fields.insert(String::from("updatedAt"), to_value(path, &now)?);
                effects.merge(path.clone(), fields);
            }
        }
        ApprovalPayload::CommuteUpdate(p) => {
            if approve {
                let path: &DocPath = &targets[0];
                check_role_fence(reads, path, approval)?;
                let mut fields: Map<String, Value> = Map::new();
                fields.insert(String::from("commute"), to_value(path, &p.commute.to_policy())?);
                fields.insert(String::from("updatedAt"), to_value(path, &now)?);
                effects.merge(path.clone(), fields);
            }
        }
        ApprovalPayload::AllowanceAdd(p) => {
            if approve {
                let path: &DocPath = &targets[0];
                check_allowance_fence(reads.get(path), path, approval)?;
                let assignment: AllowanceAssignment = new_assignment(path, approval, p, now);
                effects.merge(path.clone(), to_fields(path, &assignment)?);
            }
        }
        ApprovalPayload::AllowanceUpdate(p) => {
            if approve {
                let path: &DocPath = &targets[0];
                let existing: &Document = existing_allowance(reads, path)?;
                check_allowance_fence(Some(existing), path, approval)?;
                effects.merge(path.clone(), update_fields(path, p, now)?);
            }
        }
        ApprovalPayload::AllowanceEnd(p) => {
            if approve {
                let path: &DocPath = &targets[0];
                let existing: &Document = existing_allowance(reads, path)?;
                check_allowance_fence(Some(existing), path, approval)?;
                let mut fields: Map<String, Value> = Map::new();
                fields.insert(String::from("status"), to_value(path, &AllowanceStatus::Ended)?);
                if let Some(effective_to) = p.effective_to {
                    fields.insert(String::from("effectiveTo"), to_value(path, &effective_to)?);
                }
                fields.insert(String::from("updatedAt"), to_value(path, &now)?);
                effects.merge(path.clone(), fields);
            }
        }
    }

    let primary: Option<&DocPath> = targets.first();
    let before: Option<&Value> = primary
        .and_then(|path| reads.get(path))
        .map(|doc| &doc.data);
    let after: Option<Value> = effects
        .writes
        .iter()
        .filter(|op| Some(op.path()) == primary)
        .fold(before.cloned(), |current, op| op.apply(current.as_ref()));

    let mut decided: ApprovalSummary = approval.clone();
    decided.status = decision.action.resulting_status();
    decided.decided_by = Some(decision.actor.id.clone());
    decided.decided_at = Some(now);
    decided.comment.clone_from(&decision.comment);

    let log_entry: ApprovalLogEntry = ApprovalLogEntry {
        id: log_id.to_string(),
        approval_id: approval.id.clone(),
        approval_kind: approval.kind,
        action: decision.action,
        actor: decision.actor.clone(),
        comment: decision.comment.clone(),
        batch_id: approval.batch_id().map(String::from),
        store_id: approval.store_id.clone(),
        before: before.cloned().map_or_else(StateSnapshot::absent, StateSnapshot::new),
        after: after.map_or_else(StateSnapshot::absent, StateSnapshot::new),
        created_at: now,
    };

    let approval_path: DocPath = DocPath::approval(&approval.id)?;
    let log_path: DocPath = DocPath::approval_log(log_id)?;

    let mut batch: WriteBatch = WriteBatch::new().require(approval_path.clone(), Some(approval_version));
    for op in &effects.writes {
        if !batch.preconditions.iter().any(|pre| &pre.path == op.path()) {
            batch = batch.require(op.path().clone(), reads.version(op.path()));
        }
    }
    batch = batch.require(log_path.clone(), None);
    for op in effects.writes {
        batch = batch.write(op);
    }
    batch = batch
        .write(WriteOp::Set {
            path: approval_path.clone(),
            data: to_value(&approval_path, &decided)?,
        })
        .write(WriteOp::Set {
            path: log_path.clone(),
            data: to_value(&log_path, &log_entry)?,
        });

    Ok(DecisionTransition {
        batch,
        decided,
        log_entry,
    })
}

fn to_value<T: serde::Serialize>(path: &DocPath, value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|err| CoreError::MalformedDocument {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

fn check_role_fence(
    reads: &ReadSet,
    path: &DocPath,
    approval: &ApprovalSummary,
) -> Result<(), CoreError> {
    let document: &Document = reads.get(path).ok_or_else(|| CoreError::MissingRoleDocument {
        role_doc_id: path.id().to_string(),
    })?;
    let role: UserStoreRole = document.decode()?;
    if is_stale(role.updated_at, approval.submitted_at) {
        return Err(CoreError::StaleRoleDocument {
            role_doc_id: path.id().to_string(),
        });
    }
    Ok(())
}

fn existing_allowance<'a>(reads: &'a ReadSet, path: &DocPath) -> Result<&'a Document, CoreError> {
    reads.get(path).ok_or_else(|| CoreError::AllowanceNotFound {
        allowance_id: path.id().to_string(),
    })
}

fn check_allowance_fence(
    existing: Option<&Document>,
    path: &DocPath,
    approval: &ApprovalSummary,
) -> Result<(), CoreError> {
    let Some(document) = existing else {
        return Ok(());
    };
    let updated_at: Option<Timestamp> = document
        .data
        .get("updatedAt")
        .cloned()
        .map(serde_json::from_value::<Option<Timestamp>>)
        .transpose()
        .map_err(|err| CoreError::MalformedDocument {
            path: path.to_string(),
            reason: err.to_string(),
        })?
        .flatten();
    if is_stale(updated_at, approval.submitted_at) {
        return Err(CoreError::StaleAllowanceDocument {
            allowance_id: path.id().to_string(),
        });
    }
    Ok(())
}

fn new_assignment(
    path: &DocPath,
    approval: &ApprovalSummary,
    payload: &AllowanceChangePayload,
    now: Timestamp,
) -> AllowanceAssignment {
    AllowanceAssignment {
        id: path.id().to_string(),
        store_id: approval.store_id.clone(),
        role_doc_id: payload.target_role_doc_id.clone(),
        user_id: payload.target_user_id.clone(),
        name: payload.name.trim().to_string(),
        status: AllowanceStatus::Active,
        master_id: payload.master_id.clone(),
        amount: payload.amount,
        tax_exempt: payload.tax_exempt,
        note: payload.note.clone(),
        effective_from: payload.effective_from,
        effective_to: payload.effective_to,
        updated_at: Some(now),
    }
}

fn update_fields(
    path: &DocPath,
    payload: &AllowanceChangePayload,
    now: Timestamp,
) -> Result<Map<String, Value>, CoreError> {
    let mut fields: Map<String, Value> = Map::new();
    fields.insert(String::from("name"), Value::String(payload.name.trim().to_string()));
    if let Some(master_id) = &payload.master_id {
        fields.insert(String::from("masterId"), Value::String(master_id.clone()));
    }
    if let Some(amount) = payload.amount {
        fields.insert(String::from("amount"), Value::from(amount));
    }
    if let Some(tax_exempt) = payload.tax_exempt {
        fields.insert(String::from("taxExempt"), Value::Bool(tax_exempt));
    }
    if let Some(note) = &payload.note {
        fields.insert(String::from("note"), Value::String(note.clone()));
    }
    if let Some(effective_from) = payload.effective_from {
        fields.insert(String::from("effectiveFrom"), to_value(path, &effective_from)?);
    }
    if let Some(effective_to) = payload.effective_to {
        fields.insert(String::from("effectiveTo"), to_value(path, &effective_to)?);
    }
    fields.insert(String::from("updatedAt"), to_value(path, &now)?);
    Ok(fields)
}
