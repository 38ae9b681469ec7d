// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Decision, Document, ReadSet, WriteOp};
use serde_json::{Value, json};
use shiftdesk_audit::{Actor, DecisionAction};
use shiftdesk_domain::{
    AllowanceChangePayload, ApprovalPayload, ApprovalStatus, ApprovalSummary, BatchContext,
    DateKey, DocPath, EmploymentChangePayload, EmploymentTerms, MonthKey, ShiftEntry, Timestamp,
};

pub fn ts(value: &str) -> Timestamp {
    Timestamp::parse(value).unwrap()
}

pub fn june() -> MonthKey {
    "202406".parse().unwrap()
}

pub fn date(value: &str) -> DateKey {
    value.parse().unwrap()
}

pub fn entry(store: &str, start: &str, end: &str) -> ShiftEntry {
    ShiftEntry::new(store, start, end, None).unwrap()
}

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("admin-1"), String::from("admin"))
}

pub fn create_test_decision(action: DecisionAction, comment: Option<&str>) -> Decision {
    Decision {
        action,
        actor: create_test_actor(),
        comment: comment.map(String::from),
    }
}

pub fn create_test_approval(payload: ApprovalPayload, submitted_at: Option<&str>) -> ApprovalSummary {
    ApprovalSummary {
        id: String::from("approval_1"),
        store_id: String::from("s1"),
        kind: payload.kind(),
        status: ApprovalStatus::Pending,
        title: String::from("Test"),
        submitted_by: String::from("manager-1"),
        submitted_at: submitted_at.map(ts),
        comment_required: false,
        payload,
        target: None,
        batch_context: Some(BatchContext {
            id: String::from("batch_1"),
            index: 0,
            count: 1,
        }),
        decided_by: None,
        decided_at: None,
        comment: None,
    }
}

pub fn employment_payload() -> ApprovalPayload {
    ApprovalPayload::EmploymentChange(EmploymentChangePayload {
        target_user_id: String::from("u1"),
        target_role_doc_id: String::from("u1_s1"),
        employment: EmploymentTerms {
            employment_type: Some(String::from("part_time")),
            base_rate: Some(1200),
            base_hours: Some(20.0),
            note: None,
            effective_from: None,
        },
    })
}

pub fn allowance_change(name: &str) -> AllowanceChangePayload {
    AllowanceChangePayload {
        target_user_id: String::from("u1"),
        target_role_doc_id: String::from("u1_s1"),
        name: name.to_string(),
        master_id: Some(String::from("night")),
        amount: Some(5000),
        tax_exempt: Some(false),
        note: None,
        effective_from: None,
        effective_to: None,
    }
}

pub fn document(path: &DocPath, data: Value, version: u64) -> Document {
    Document {
        path: path.clone(),
        data,
        version,
    }
}

pub fn role_path() -> DocPath {
    DocPath::user_store_role("u1_s1").unwrap()
}

pub fn role_document(updated_at: Option<&str>, version: u64) -> Document {
    document(
        &role_path(),
        json!({
            "userId": "u1",
            "storeId": "s1",
            "role": "staff",
            "isResigned": false,
            "updatedAt": updated_at,
        }),
        version,
    )
}

pub fn reads_with(path: DocPath, doc: Option<Document>) -> ReadSet {
    [(path, doc)].into_iter().collect()
}

pub fn merge_at<'a>(writes: &'a [WriteOp], path: &DocPath) -> &'a serde_json::Map<String, Value> {
    writes
        .iter()
        .find_map(|op| match op {
            WriteOp::Merge { path: p, fields } if p == path => Some(fields),
            _ => None,
        })
        .expect("no merge at path")
}
