// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde_json::{Value, json};
use shiftdesk::{WriteBatch, WriteOp};
use shiftdesk_audit::{ApprovalLogEntry, DecisionAction};
use shiftdesk_domain::{
    AllowanceChangePayload, ApprovalPayload, ApprovalStatus, ApprovalSummary, BatchContext,
    DocPath, Timestamp, collections,
};
use shiftdesk_persistence::{DocumentStore, MemoryStore};
use std::sync::Arc;

use crate::tests::helpers::{
    RacingStore, allowance_template, commute_template, create_test_admin, create_test_manager,
    decision_by, employment_template, merge_fields, read, role_path, seed, seed_role, shared,
};
use crate::{ApiError, ApprovalEngine, BulkDecisionResponse, DecisionInput, ErrorCategory};

const SUBMITTED_AT: &str = "2024-06-01T09:00:00Z";

fn create_test_approval(id: &str, payload: ApprovalPayload) -> ApprovalSummary {
    let payload: ApprovalPayload = payload.with_target("u1", "u1_s1").unwrap();
    ApprovalSummary {
        id: id.to_string(),
        store_id: String::from("s1"),
        kind: payload.kind(),
        status: ApprovalStatus::Pending,
        title: String::from("Change"),
        submitted_by: String::from("manager-1"),
        submitted_at: Some(Timestamp::parse(SUBMITTED_AT).unwrap()),
        comment_required: false,
        target: None,
        payload,
        batch_context: None,
        decided_by: None,
        decided_at: None,
        comment: None,
    }
}

fn in_batch(mut approval: ApprovalSummary, batch_id: &str, index: u32) -> ApprovalSummary {
    approval.batch_context = Some(BatchContext {
        id: batch_id.to_string(),
        index,
        count: 2,
    });
    approval
}

async fn seed_approval(store: &dyn DocumentStore, approval: &ApprovalSummary) {
    seed(
        store,
        &DocPath::approval(&approval.id).unwrap(),
        serde_json::to_value(approval).unwrap(),
    )
    .await;
}

async fn stored_approval(store: &dyn DocumentStore, id: &str) -> ApprovalSummary {
    read(store, &DocPath::approval(id).unwrap())
        .await
        .unwrap()
        .decode()
        .unwrap()
}

fn admin_decision() -> DecisionInput {
    decision_by(create_test_admin(), None)
}

#[tokio::test]
async fn test_approve_employment_change_merges_terms() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", Some("2024-05-01T00:00:00Z")).await;
    seed_approval(
        store.as_ref(),
        &create_test_approval("a1", employment_template()),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let decided: ApprovalSummary = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap();

    assert_eq!(decided.status, ApprovalStatus::Approved);
    assert_eq!(decided.decided_by.as_deref(), Some("admin-1"));
    let role: Value = read(store.as_ref(), &role_path("u1_s1")).await.unwrap().data;
    assert_eq!(role["employment"]["type"], json!("full_time"));
    assert_eq!(role["employment"]["baseRate"], json!(1500));
    assert_eq!(role["role"], json!("staff"));
    assert_ne!(role["updatedAt"], json!("2024-05-01T00:00:00Z"));
    assert_eq!(
        stored_approval(store.as_ref(), "a1").await.status,
        ApprovalStatus::Approved
    );
}

#[tokio::test]
async fn test_stale_role_document_blocks_approval() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", Some("2024-06-02T00:00:00Z")).await;
    seed_approval(
        store.as_ref(),
        &create_test_approval("a1", employment_template()),
    )
    .await;
    let before: Value = read(store.as_ref(), &role_path("u1_s1")).await.unwrap().data;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let err: ApiError = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "STALE_ROLE_DOCUMENT");
    assert_eq!(err.category(), ErrorCategory::Conflict);
    let after: Value = read(store.as_ref(), &role_path("u1_s1")).await.unwrap().data;
    assert_eq!(before, after);
    assert!(stored_approval(store.as_ref(), "a1").await.is_pending());
}

#[tokio::test]
async fn test_missing_role_document_is_reported() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_approval(
        store.as_ref(),
        &create_test_approval("a1", employment_template()),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let err: ApiError = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "MISSING_ROLE_DOCUMENT");
}

#[tokio::test]
async fn test_reject_leaves_role_untouched() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", Some("2024-06-02T00:00:00Z")).await;
    seed_approval(
        store.as_ref(),
        &create_test_approval("a1", employment_template()),
    )
    .await;
    let before: Value = read(store.as_ref(), &role_path("u1_s1")).await.unwrap().data;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let decided: ApprovalSummary = engine
        .reject_approval("a1", &decision_by(create_test_admin(), Some("not now")))
        .await
        .unwrap();

    assert_eq!(decided.status, ApprovalStatus::Rejected);
    assert_eq!(decided.comment.as_deref(), Some("not now"));
    let after: Value = read(store.as_ref(), &role_path("u1_s1")).await.unwrap().data;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_allowance_add_creates_slugged_document() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_approval(
        store.as_ref(),
        &create_test_approval(
            "a1",
            ApprovalPayload::AllowanceAdd(allowance_template("Night Shift!")),
        ),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap();

    let allowance: Value = read(
        store.as_ref(),
        &DocPath::allowance("u1_s1__night-shift").unwrap(),
    )
    .await
    .unwrap()
    .data;
    assert_eq!(allowance["name"], json!("Night Shift!"));
    assert_eq!(allowance["status"], json!("active"));
    assert_eq!(allowance["amount"], json!(3000));
    assert_eq!(allowance["roleDocId"], json!("u1_s1"));
}

#[tokio::test]
async fn test_allowance_without_name_is_refused() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_approval(
        store.as_ref(),
        &create_test_approval(
            "a1",
            ApprovalPayload::AllowanceAdd(allowance_template("  ")),
        ),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let err: ApiError = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "ALLOWANCE_NAME_REQUIRED");
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[tokio::test]
async fn test_allowance_without_name_can_still_be_rejected() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_approval(
        store.as_ref(),
        &create_test_approval(
            "a1",
            ApprovalPayload::AllowanceAdd(allowance_template("!!!")),
        ),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let rejected: ApprovalSummary = engine
        .reject_approval("a1", &admin_decision())
        .await
        .unwrap();

    assert_eq!(rejected.status, ApprovalStatus::Rejected);
    assert_eq!(stored_approval(store.as_ref(), "a1").await.status, ApprovalStatus::Rejected);
    assert!(store.list(collections::ALLOWANCES).await.unwrap().is_empty());
    assert_eq!(engine.approval_logs("a1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_allowance_update_requires_existing_document() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_approval(
        store.as_ref(),
        &create_test_approval(
            "a1",
            ApprovalPayload::AllowanceUpdate(allowance_template("Night Shift")),
        ),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let err: ApiError = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "ALLOWANCE_NOT_FOUND");
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_allowance_end_soft_closes() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed(
        store.as_ref(),
        &DocPath::allowance("u1_s1__night-shift").unwrap(),
        json!({
            "id": "u1_s1__night-shift",
            "storeId": "s1",
            "roleDocId": "u1_s1",
            "userId": "u1",
            "name": "Night Shift",
            "status": "active",
            "amount": 3000,
            "updatedAt": "2024-05-01T00:00:00Z",
        }),
    )
    .await;
    let ending: AllowanceChangePayload = AllowanceChangePayload {
        effective_to: Some("2024-06-30".parse().unwrap()),
        ..allowance_template("Night Shift")
    };
    seed_approval(
        store.as_ref(),
        &create_test_approval("a1", ApprovalPayload::AllowanceEnd(ending)),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap();

    let allowance: Value = read(
        store.as_ref(),
        &DocPath::allowance("u1_s1__night-shift").unwrap(),
    )
    .await
    .unwrap()
    .data;
    assert_eq!(allowance["status"], json!("ended"));
    assert_eq!(allowance["effectiveTo"], json!("2024-06-30"));
    assert_eq!(allowance["amount"], json!(3000));
}

#[tokio::test]
async fn test_unknown_commute_mode_is_stored_as_null() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(store.as_ref(), &create_test_approval("a1", commute_template("bus"))).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    engine
        .approve_approval("a1", &decision_by(create_test_manager(), None))
        .await
        .unwrap();

    let role: Value = read(store.as_ref(), &role_path("u1_s1")).await.unwrap().data;
    assert_eq!(role["commute"]["mode"], Value::Null);
    assert_eq!(role["commute"]["unitAmount"], json!(400));
}

#[tokio::test]
async fn test_second_decision_is_refused() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(store.as_ref(), &create_test_approval("a1", commute_template("fixed"))).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));
    engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap();

    let err: ApiError = engine
        .reject_approval("a1", &admin_decision())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "ALREADY_DECIDED");
    assert_eq!(
        stored_approval(store.as_ref(), "a1").await.status,
        ApprovalStatus::Approved
    );
}

#[tokio::test]
async fn test_required_comment_must_not_be_blank() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    let mut approval: ApprovalSummary = create_test_approval("a1", commute_template("fixed"));
    approval.comment_required = true;
    seed_approval(store.as_ref(), &approval).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let blank: ApiError = engine
        .reject_approval("a1", &decision_by(create_test_admin(), Some("   ")))
        .await
        .unwrap_err();
    let decided: ApprovalSummary = engine
        .reject_approval("a1", &decision_by(create_test_admin(), Some(" wrong store ")))
        .await
        .unwrap();

    assert_eq!(blank.code(), "COMMENT_REQUIRED");
    assert_eq!(blank.category(), ErrorCategory::Validation);
    assert_eq!(decided.comment.as_deref(), Some("wrong store"));
}

#[tokio::test]
async fn test_manager_cannot_decide_employment_change() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(
        store.as_ref(),
        &create_test_approval("a1", employment_template()),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let err: ApiError = engine
        .approve_approval("a1", &decision_by(create_test_manager(), None))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "UNAUTHORIZED");
    assert_eq!(err.category(), ErrorCategory::Authorization);
    assert!(stored_approval(store.as_ref(), "a1").await.is_pending());
}

#[tokio::test]
async fn test_missing_approval_is_not_found() {
    let engine: ApprovalEngine = ApprovalEngine::new(Arc::new(MemoryStore::new()));

    let err: ApiError = engine
        .approve_approval("nope", &admin_decision())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_decision_retries_after_lost_race() {
    let store: Arc<RacingStore> = Arc::new(RacingStore::new(role_path("u1_s1"), 1));
    seed_role(&store.inner, "u1", None).await;
    seed_approval(&store.inner, &create_test_approval("a1", employment_template())).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let decided: ApprovalSummary = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap();

    assert_eq!(decided.status, ApprovalStatus::Approved);
    assert_eq!(store.races_left(), 0);
    let role: Value = read(&store.inner, &role_path("u1_s1")).await.unwrap().data;
    assert_eq!(role["touchedBy"], json!("someone-else"));
    assert_eq!(role["employment"]["type"], json!("full_time"));
    let logs: Vec<ApprovalLogEntry> = engine.approval_logs("a1").await.unwrap();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn test_decision_gives_up_under_sustained_contention() {
    let store: Arc<RacingStore> = Arc::new(RacingStore::new(role_path("u1_s1"), 10));
    seed_role(&store.inner, "u1", None).await;
    seed_approval(&store.inner, &create_test_approval("a1", employment_template())).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store)).with_max_attempts(2);

    let err: ApiError = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "TRANSACTION_CONTENTION");
    assert_eq!(err.category(), ErrorCategory::Conflict);
    assert_eq!(store.races_left(), 8);
    assert!(stored_approval(&store.inner, "a1").await.is_pending());
    assert!(engine.approval_logs("a1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_decision_writes_audit_entry() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(
        store.as_ref(),
        &in_batch(create_test_approval("a1", employment_template()), "b1", 0),
    )
    .await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    engine
        .approve_approval("a1", &decision_by(create_test_admin(), Some("ok")))
        .await
        .unwrap();

    let logs: Vec<ApprovalLogEntry> = engine.approval_logs("a1").await.unwrap();
    assert_eq!(logs.len(), 1);
    let entry: &ApprovalLogEntry = &logs[0];
    assert_eq!(entry.action, DecisionAction::Approve);
    assert_eq!(entry.actor.id, "admin-1");
    assert_eq!(entry.actor.actor_type, "admin");
    assert_eq!(entry.comment.as_deref(), Some("ok"));
    assert_eq!(entry.batch_id.as_deref(), Some("b1"));
    assert!(entry.before.data.get("employment").is_none());
    assert_eq!(entry.after.data["employment"]["type"], json!("full_time"));
}

#[tokio::test]
async fn test_bulk_decision_refuses_mixed_batches() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(
        store.as_ref(),
        &in_batch(create_test_approval("a1", commute_template("fixed")), "b1", 0),
    )
    .await;
    seed_approval(
        store.as_ref(),
        &in_batch(create_test_approval("a2", commute_template("fixed")), "b2", 0),
    )
    .await;
    seed_approval(store.as_ref(), &create_test_approval("a3", commute_template("fixed"))).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let across: ApiError = engine
        .bulk_decide(
            &[String::from("a1"), String::from("a2")],
            DecisionAction::Approve,
            &admin_decision(),
        )
        .await
        .unwrap_err();
    let mixed: ApiError = engine
        .bulk_decide(
            &[String::from("a1"), String::from("a3")],
            DecisionAction::Approve,
            &admin_decision(),
        )
        .await
        .unwrap_err();

    assert_eq!(across.code(), "MIXED_BATCH");
    assert_eq!(mixed.code(), "MIXED_BATCH");
    for id in ["a1", "a2", "a3"] {
        assert!(stored_approval(store.as_ref(), id).await.is_pending());
    }
}

#[tokio::test]
async fn test_bulk_decision_reports_each_outcome() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(
        store.as_ref(),
        &in_batch(create_test_approval("a1", commute_template("fixed")), "b1", 0),
    )
    .await;
    let mut required: ApprovalSummary =
        in_batch(create_test_approval("a2", commute_template("actual")), "b1", 1);
    required.comment_required = true;
    seed_approval(store.as_ref(), &required).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let response: BulkDecisionResponse = engine
        .bulk_decide(
            &[String::from("a1"), String::from("a2")],
            DecisionAction::Approve,
            &admin_decision(),
        )
        .await
        .unwrap();

    assert_eq!(response.batch_id.as_deref(), Some("b1"));
    assert_eq!(response.outcomes.len(), 2);
    assert_eq!(response.outcomes[0].status, Some(ApprovalStatus::Approved));
    assert!(response.outcomes[0].error.is_none());
    assert_eq!(response.outcomes[1].status, None);
    assert_eq!(
        response.outcomes[1].error.as_ref().unwrap().code,
        "COMMENT_REQUIRED"
    );
}

#[tokio::test]
async fn test_logs_are_scoped_to_their_approval() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(store.as_ref(), &create_test_approval("a1", commute_template("fixed"))).await;
    seed_approval(store.as_ref(), &create_test_approval("a2", commute_template("fixed"))).await;
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));
    engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap();
    engine
        .reject_approval("a2", &admin_decision())
        .await
        .unwrap();

    let logs: Vec<ApprovalLogEntry> = engine.approval_logs("a2").await.unwrap();

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, DecisionAction::Reject);
    assert!(engine.approval_logs("a3").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unrelated_writes_do_not_disturb_decision() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_role(store.as_ref(), "u1", None).await;
    seed_approval(store.as_ref(), &create_test_approval("a1", commute_template("fixed"))).await;
    store
        .commit(WriteBatch::new().write(WriteOp::Merge {
            path: role_path("u2_s1"),
            fields: merge_fields(&[("userId", json!("u2"))]),
        }))
        .await
        .unwrap();
    let engine: ApprovalEngine = ApprovalEngine::new(shared(&store));

    let decided: ApprovalSummary = engine
        .approve_approval("a1", &admin_decision())
        .await
        .unwrap();

    assert_eq!(decided.status, ApprovalStatus::Approved);
}
