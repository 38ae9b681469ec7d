// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions, fixtures and store fakes.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use shiftdesk::{Document, WriteBatch, WriteOp};
use shiftdesk_domain::{
    AllowanceChangePayload, ApprovalPayload, CommuteRequest, CommuteUpdatePayload, DateKey,
    DocPath, EmploymentChangePayload, EmploymentTerms, MonthKey, Role, ShiftEntry, ShiftWindow,
};
use shiftdesk_persistence::{
    CommitReceipt, DocumentChange, DocumentStore, MemoryStore, PersistenceError,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use tokio::sync::{Semaphore, broadcast};

use crate::{AuthenticatedActor, CreateBatchRequest, DecisionInput};

pub fn june() -> MonthKey {
    "202406".parse().unwrap()
}

pub fn date(value: &str) -> DateKey {
    value.parse().unwrap()
}

pub fn entry(store: &str, start: &str, end: &str) -> ShiftEntry {
    ShiftEntry::new(store, start, end, None).unwrap()
}

pub fn create_test_admin() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("admin-1"), Role::Admin)
}

pub fn create_test_manager() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("manager-1"), Role::Manager)
}

pub fn create_test_staff() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("staff-1"), Role::Staff)
}

pub fn decision_by(actor: AuthenticatedActor, comment: Option<&str>) -> DecisionInput {
    DecisionInput::new(actor, comment.map(String::from))
}

/// Writes `data` at `path` unconditionally.
pub async fn seed(store: &dyn DocumentStore, path: &DocPath, data: Value) -> u64 {
    store
        .commit(WriteBatch::new().write(WriteOp::Set {
            path: path.clone(),
            data,
        }))
        .await
        .unwrap()
        .version
}

pub async fn read(store: &dyn DocumentStore, path: &DocPath) -> Option<Document> {
    store.get(path).await.unwrap()
}

pub fn role_path(role_doc_id: &str) -> DocPath {
    DocPath::user_store_role(role_doc_id).unwrap()
}

pub fn role_body(user_id: &str, store_id: &str, updated_at: Option<&str>) -> Value {
    json!({
        "userId": user_id,
        "storeId": store_id,
        "role": "staff",
        "isResigned": false,
        "updatedAt": updated_at,
    })
}

pub async fn seed_role(store: &dyn DocumentStore, user_id: &str, updated_at: Option<&str>) {
    seed(
        store,
        &role_path(&format!("{user_id}_s1")),
        role_body(user_id, "s1", updated_at),
    )
    .await;
}

pub async fn seed_window(store: &dyn DocumentStore, month: MonthKey, window: &ShiftWindow) {
    seed(
        store,
        &DocPath::submit_window(month).unwrap(),
        serde_json::to_value(window).unwrap(),
    )
    .await;
}

pub fn employment_template() -> ApprovalPayload {
    ApprovalPayload::EmploymentChange(EmploymentChangePayload {
        target_user_id: String::new(),
        target_role_doc_id: String::new(),
        employment: EmploymentTerms {
            employment_type: Some(String::from("full_time")),
            base_rate: Some(1500),
            base_hours: Some(40.0),
            note: None,
            effective_from: None,
        },
    })
}

pub fn allowance_template(name: &str) -> AllowanceChangePayload {
    AllowanceChangePayload {
        target_user_id: String::new(),
        target_role_doc_id: String::new(),
        name: name.to_string(),
        master_id: None,
        amount: Some(3000),
        tax_exempt: Some(false),
        note: None,
        effective_from: None,
        effective_to: None,
    }
}

pub fn commute_template(mode: &str) -> ApprovalPayload {
    ApprovalPayload::CommuteUpdate(CommuteUpdatePayload {
        target_user_id: String::new(),
        target_role_doc_id: String::new(),
        commute: CommuteRequest {
            mode: Some(mode.to_string()),
            unit_amount: Some(400),
            monthly_cap: Some(20000),
            note: None,
        },
    })
}

pub fn batch_request(targets: &[&str], payload: ApprovalPayload) -> CreateBatchRequest {
    CreateBatchRequest {
        store_id: String::from("s1"),
        target_role_doc_ids: targets.iter().map(|id| (*id).to_string()).collect(),
        payload,
        title: None,
        comment_required: false,
    }
}

pub fn merge_fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}

/// Counts commits passed through to a [`MemoryStore`].
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    commits: AtomicUsize,
}

impl CountingStore {
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, PersistenceError> {
        self.inner.get(path).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError> {
        self.inner.list(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, PersistenceError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(batch).await
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.inner.subscribe()
    }
}

/// A [`MemoryStore`] whose reads or commits can be made to fail.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail_reads: AtomicBool,
    pub fail_commits: AtomicBool,
}

impl FailingStore {
    pub fn failing_commits() -> Self {
        let store: Self = Self::default();
        store.fail_commits.store(true, Ordering::SeqCst);
        store
    }

    fn check(flag: &AtomicBool) -> Result<(), PersistenceError> {
        if flag.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable(String::from("simulated outage")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, PersistenceError> {
        Self::check(&self.fail_reads)?;
        self.inner.get(path).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError> {
        Self::check(&self.fail_reads)?;
        self.inner.list(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, PersistenceError> {
        Self::check(&self.fail_commits)?;
        self.inner.commit(batch).await
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.inner.subscribe()
    }
}

/// Holds every commit until [`GatedStore::release`] is called.
pub struct GatedStore {
    pub inner: MemoryStore,
    gate: Semaphore,
}

impl GatedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            gate: Semaphore::new(0),
        }
    }

    /// Lets one held commit through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, PersistenceError> {
        self.inner.get(path).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError> {
        self.inner.list(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, PersistenceError> {
        self.gate
            .acquire()
            .await
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?
            .forget();
        self.inner.commit(batch).await
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.inner.subscribe()
    }
}

/// Touches `race_path` just before each of the first `races` commits, so
/// those commits lose their version preconditions.
pub struct RacingStore {
    pub inner: MemoryStore,
    race_path: DocPath,
    races: AtomicU32,
}

impl RacingStore {
    pub fn new(race_path: DocPath, races: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            race_path,
            races: AtomicU32::new(races),
        }
    }

    pub fn races_left(&self) -> u32 {
        self.races.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for RacingStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, PersistenceError> {
        self.inner.get(path).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError> {
        self.inner.list(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, PersistenceError> {
        let racing: bool = self
            .races
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if racing {
            self.inner
                .commit(WriteBatch::new().write(WriteOp::Merge {
                    path: self.race_path.clone(),
                    fields: merge_fields(&[("touchedBy", json!("someone-else"))]),
                }))
                .await?;
        }
        self.inner.commit(batch).await
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.inner.subscribe()
    }
}

pub fn shared<S: DocumentStore + 'static>(store: &Arc<S>) -> Arc<dyn DocumentStore> {
    Arc::clone(store) as Arc<dyn DocumentStore>
}
