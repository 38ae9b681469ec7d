// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-day shift request synchronization for one user's month.
//!
//! Local state lives in a [`DayBook`]; this module drives it against a
//! [`DocumentStore`]. Saves show local intent immediately, roll back on
//! failure, and are serialized per date. The month subscription keeps
//! non-pending days in line with the store.

use shiftdesk::{
    DayBook, DayState, Document, ReconcileOutcome, RemoteDay, SavePlan, WriteBatch, WriteOp,
    day_write,
};
use shiftdesk_domain::{
    DateKey, DayRequest, DocPath, MonthKey, ShiftEntry, Timestamp, merge_entries,
};
use shiftdesk_persistence::{CommitReceipt, DocumentChange, DocumentStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::window::ShiftWindowGate;

/// The result of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The normalized entries equal the current ones; nothing was written.
    Unchanged,
    /// The day was written (or deleted, for an empty list) at `version`.
    Written {
        /// The commit version.
        version: u64,
    },
}

/// Decrements the in-flight counter when dropped.
struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Commits a started save and confirms or rolls it back.
///
/// Runs detached from the caller; `held` keeps the date serialized and the
/// save counted until the book is settled.
#[allow(clippy::too_many_arguments)]
async fn finish_save(
    store: Arc<dyn DocumentStore>,
    book: Arc<Mutex<DayBook>>,
    user_id: String,
    date: DateKey,
    op: WriteOp,
    now: Timestamp,
    deleting: bool,
    held: (OwnedMutexGuard<()>, InFlightGuard),
) -> Result<SaveOutcome, ApiError> {
    let _held = held;
    match store.commit(WriteBatch::new().write(op)).await {
        Ok(receipt) => {
            let CommitReceipt { version, .. } = receipt;
            let updated_at: Option<Timestamp> = if deleting { None } else { Some(now) };
            book.lock().await.confirm_save(date, version, updated_at)?;
            info!(%user_id, %date, version, deleted = deleting, "Saved day");
            Ok(SaveOutcome::Written { version })
        }
        Err(err) => {
            let err: ApiError = err.into();
            warn!(%user_id, %date, error = %err, "Save failed; rolled back");
            book.lock().await.rollback_save(date, err.to_string())?;
            Err(err)
        }
    }
}

/// Synchronizes one user's day requests for one month.
pub struct DayRequestSync {
    store: Arc<dyn DocumentStore>,
    book: Arc<Mutex<DayBook>>,
    date_locks: Mutex<HashMap<DateKey, Arc<Mutex<()>>>>,
    in_flight: Arc<AtomicUsize>,
    window_gate: Option<ShiftWindowGate>,
    user_id: String,
    month: MonthKey,
}

impl DayRequestSync {
    /// Creates an engine for `user_id`'s `month`.
    ///
    /// # Arguments
    ///
    /// * `store` - The document store
    /// * `user_id` - The owning user
    /// * `month` - The month to synchronize
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, user_id: String, month: MonthKey) -> Self {
        Self {
            store,
            book: Arc::new(Mutex::new(DayBook::new(user_id.clone(), month))),
            date_locks: Mutex::new(HashMap::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            window_gate: None,
            user_id,
            month,
        }
    }

    /// Refuses changing saves unless the month's window allows the date.
    #[must_use]
    pub fn with_window_gate(mut self, gate: ShiftWindowGate) -> Self {
        self.window_gate = Some(gate);
        self
    }

    /// The owning user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The month.
    #[must_use]
    pub const fn month(&self) -> MonthKey {
        self.month
    }

    async fn date_lock(&self, date: DateKey) -> Arc<Mutex<()>> {
        let mut locks = self.date_locks.lock().await;
        Arc::clone(locks.entry(date).or_default())
    }

    /// Reads `date` from the store into local state.
    ///
    /// Returns the stored request, or `None` when the day has no document.
    ///
    /// # Errors
    ///
    /// Returns an error if the date is outside the month or the read fails.
    /// A failed read leaves the day in the error phase.
    pub async fn load_day(&self, date: DateKey) -> Result<Option<DayRequest>, ApiError> {
        let lock: Arc<Mutex<()>> = self.date_lock(date).await;
        let _serial = lock.lock().await;
        self.load_day_locked(date).await
    }

    async fn load_day_locked(&self, date: DateKey) -> Result<Option<DayRequest>, ApiError> {
        let path: DocPath = DocPath::day_request(&self.user_id, self.month, date)?;
        self.book.lock().await.begin_load(date)?;

        match self.read_day(&path).await {
            Ok((request, remote)) => {
                self.book.lock().await.finish_load(date, remote)?;
                debug!(user_id = %self.user_id, %date, exists = request.is_some(), "Loaded day");
                Ok(request)
            }
            Err(err) => {
                warn!(user_id = %self.user_id, %date, error = %err, "Failed to load day");
                self.book.lock().await.fail_load(date, err.to_string())?;
                Err(err)
            }
        }
    }

    async fn read_day(
        &self,
        path: &DocPath,
    ) -> Result<(Option<DayRequest>, RemoteDay), ApiError> {
        match self.store.get(path).await? {
            Some(document) => {
                let request: DayRequest = document.decode()?;
                let remote: RemoteDay = RemoteDay::from_request(request.clone(), document.version);
                Ok((Some(request), remote))
            }
            None => Ok((None, RemoteDay::absent(None))),
        }
    }

    /// Reads every day of the month with one list read.
    ///
    /// Days without a document become loaded and empty. Days with a save in
    /// flight keep their local entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails; every non-pending day is then in
    /// the error phase.
    pub async fn load_month(&self) -> Result<(), ApiError> {
        let dates: Vec<DateKey> = self.month.days()?;
        {
            let mut book = self.book.lock().await;
            for date in &dates {
                book.begin_load(*date)?;
            }
        }

        let collection: String = DocPath::day_collection(&self.user_id, self.month);
        let documents: Vec<Document> = match self.store.list(&collection).await {
            Ok(documents) => documents,
            Err(err) => {
                let err: ApiError = err.into();
                warn!(user_id = %self.user_id, month = %self.month, error = %err, "Failed to load month");
                let mut book = self.book.lock().await;
                for date in &dates {
                    book.fail_load(*date, err.to_string())?;
                }
                return Err(err);
            }
        };

        let mut found: HashMap<DateKey, RemoteDay> = HashMap::with_capacity(documents.len());
        for document in documents {
            let Ok(date) = document.path.id().parse::<DateKey>() else {
                warn!(path = %document.path, "Skipping day document with a malformed id");
                continue;
            };
            let request: DayRequest = document.decode()?;
            found.insert(date, RemoteDay::from_request(request, document.version));
        }

        let mut book = self.book.lock().await;
        for date in dates {
            let remote: RemoteDay = found.remove(&date).unwrap_or_else(|| RemoteDay::absent(None));
            book.finish_load(date, remote)?;
        }
        info!(user_id = %self.user_id, month = %self.month, "Loaded month");
        Ok(())
    }

    /// Saves `next` as the entries of `date`.
    ///
    /// The entries are normalized first; if they equal the current entries
    /// nothing is written. An unloaded day is loaded first. Otherwise the
    /// window is consulted (when a gate is attached), local state shows the
    /// new entries while the write is in flight, and a failed write restores
    /// the previous entries. An empty list deletes the day document.
    ///
    /// Saves of the same date run one at a time. Once the write starts it
    /// settles on its own task, so dropping the returned future never leaves
    /// the day pending.
    ///
    /// # Errors
    ///
    /// Returns `WINDOW_LOCKED` or `DATE_OUTSIDE_WINDOW` without writing when
    /// the window refuses the date, or an error if a read or the write fails.
    pub async fn save_day_diff(
        &self,
        date: DateKey,
        next: &[ShiftEntry],
    ) -> Result<SaveOutcome, ApiError> {
        let lock: Arc<Mutex<()>> = self.date_lock(date).await;
        let serial: OwnedMutexGuard<()> = lock.lock_owned().await;

        let needs_load: bool = {
            let book = self.book.lock().await;
            book.day(date)
                .is_none_or(|day| day.phase != shiftdesk::DayPhase::Loaded)
        };
        if needs_load {
            self.load_day_locked(date).await?;
        }

        let normalized: Vec<ShiftEntry> = merge_entries(next);
        for entry in &normalized {
            entry.validate()?;
        }
        let unchanged: bool = {
            let book = self.book.lock().await;
            book.day(date).is_some_and(|day| day.entries == normalized)
        };
        if unchanged {
            debug!(user_id = %self.user_id, %date, "Save skipped; entries unchanged");
            return Ok(SaveOutcome::Unchanged);
        }

        if let Some(gate) = &self.window_gate {
            gate.refresh(self.month).await?.check_writable(date)?;
        }

        let now: Timestamp = Timestamp::now();
        let deleting: bool = normalized.is_empty();
        let op: WriteOp = day_write(&self.user_id, self.month, date, normalized, now)?;

        let plan: SavePlan = self.book.lock().await.begin_save(date, next)?;
        if plan == SavePlan::Unchanged {
            return Ok(SaveOutcome::Unchanged);
        }

        let in_flight: InFlightGuard = InFlightGuard::enter(&self.in_flight);
        let commit: JoinHandle<Result<SaveOutcome, ApiError>> = tokio::spawn(finish_save(
            Arc::clone(&self.store),
            Arc::clone(&self.book),
            self.user_id.clone(),
            date,
            op,
            now,
            deleting,
            (serial, in_flight),
        ));
        commit.await.map_err(|err| ApiError::Transport {
            message: err.to_string(),
        })?
    }

    /// Clears `date`, deleting its document.
    ///
    /// # Errors
    ///
    /// See [`Self::save_day_diff`].
    pub async fn remove_day(&self, date: DateKey) -> Result<SaveOutcome, ApiError> {
        self.save_day_diff(date, &[]).await
    }

    /// Applies one observed change to local state.
    ///
    /// Returns `None` when the change is not a day of this month.
    ///
    /// # Errors
    ///
    /// Returns an error if the changed document does not decode.
    pub async fn apply_change(
        &self,
        change: &DocumentChange,
    ) -> Result<Option<ReconcileOutcome>, ApiError> {
        apply_change(&self.book, &self.user_id, self.month, change).await
    }

    /// Starts reconciling the month's day documents into local state.
    ///
    /// Changes are observed from the moment this returns until the returned
    /// subscription is dropped.
    #[must_use]
    pub fn subscribe_month(&self) -> MonthSubscription {
        let mut changes: broadcast::Receiver<DocumentChange> = self.store.subscribe();
        let book: Arc<Mutex<DayBook>> = Arc::clone(&self.book);
        let store: Arc<dyn DocumentStore> = Arc::clone(&self.store);
        let user_id: String = self.user_id.clone();
        let month: MonthKey = self.month;

        let task: JoinHandle<()> = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => match apply_change(&book, &user_id, month, &change).await {
                        Ok(Some(outcome)) => {
                            debug!(%user_id, path = %change.path, ?outcome, "Reconciled day");
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(%user_id, path = %change.path, error = %err, "Ignoring unreadable day change");
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(%user_id, %month, skipped, "Month listener lagged; re-reading");
                        if let Err(err) = resync(&book, store.as_ref(), &user_id, month).await {
                            warn!(%user_id, %month, error = %err, "Month resync failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        MonthSubscription { task }
    }

    /// The state of `date`, if it has been touched.
    pub async fn snapshot(&self, date: DateKey) -> Option<DayState> {
        self.book.lock().await.day(date).cloned()
    }

    /// Every touched day in date order.
    pub async fn days(&self) -> Vec<DayState> {
        self.book.lock().await.days().cloned().collect()
    }

    /// Whether any save is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The most recent save error across all days.
    pub async fn last_error(&self) -> Option<String> {
        self.book.lock().await.last_error().map(String::from)
    }
}

async fn apply_change(
    book: &Mutex<DayBook>,
    user_id: &str,
    month: MonthKey,
    change: &DocumentChange,
) -> Result<Option<ReconcileOutcome>, ApiError> {
    if !change.in_collection(&DocPath::day_collection(user_id, month)) {
        return Ok(None);
    }
    let Ok(date) = change.path.id().parse::<DateKey>() else {
        return Ok(None);
    };
    let remote: RemoteDay = match &change.data {
        Some(data) => {
            let document: Document = Document {
                path: change.path.clone(),
                data: data.clone(),
                version: change.version,
            };
            RemoteDay::from_request(document.decode()?, change.version)
        }
        None => RemoteDay::absent(Some(change.version)),
    };
    Ok(Some(book.lock().await.reconcile(date, remote)?))
}

async fn resync(
    book: &Mutex<DayBook>,
    store: &dyn DocumentStore,
    user_id: &str,
    month: MonthKey,
) -> Result<(), ApiError> {
    let documents: Vec<Document> = store
        .list(&DocPath::day_collection(user_id, month))
        .await?;
    let mut found: HashMap<DateKey, RemoteDay> = HashMap::with_capacity(documents.len());
    for document in documents {
        if let Ok(date) = document.path.id().parse::<DateKey>() {
            let request: DayRequest = document.decode()?;
            found.insert(date, RemoteDay::from_request(request, document.version));
        }
    }
    let mut book = book.lock().await;
    for date in month.days()? {
        let remote: RemoteDay = found.remove(&date).unwrap_or_else(|| RemoteDay::absent(None));
        book.reconcile(date, remote)?;
    }
    Ok(())
}

/// A running month listener.
///
/// The listener stops when this is dropped.
pub struct MonthSubscription {
    task: JoinHandle<()>,
}

impl MonthSubscription {
    /// Whether the listener has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MonthSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
