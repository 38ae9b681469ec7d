// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! An in-process document store.

use async_trait::async_trait;
use serde_json::Value;
use shiftdesk::{Document, WriteBatch};
use shiftdesk_domain::{DocPath, Timestamp};
use std::collections::BTreeMap;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use crate::error::PersistenceError;
use crate::store::{ChangeFeed, CommitReceipt, DocumentChange, DocumentStore};

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<DocPath, (Value, u64)>,
    sequence: u64,
}

/// A [`DocumentStore`] held entirely in memory.
///
/// Commits are serialized by one lock, which also makes every batch atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    feed: ChangeFeed,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored documents.
    pub async fn len(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, PersistenceError> {
        let state = self.state.lock().await;
        Ok(state.documents.get(path).map(|(data, version)| Document {
            path: path.clone(),
            data: data.clone(),
            version: *version,
        }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError> {
        let state = self.state.lock().await;
        Ok(state
            .documents
            .iter()
            .filter(|(path, _)| path.in_collection(collection))
            .map(|(path, (data, version))| Document {
                path: path.clone(),
                data: data.clone(),
                version: *version,
            })
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, PersistenceError> {
        let committed_at: Timestamp = Timestamp::now();
        let mut state = self.state.lock().await;

        for precondition in &batch.preconditions {
            let found: Option<u64> = state
                .documents
                .get(&precondition.path)
                .map(|(_, version)| *version);
            if found != precondition.expected_version {
                debug!(
                    path = %precondition.path,
                    expected = ?precondition.expected_version,
                    ?found,
                    "Commit precondition failed"
                );
                return Err(PersistenceError::Contention {
                    path: precondition.path.to_string(),
                });
            }
        }

        if batch.writes.is_empty() {
            return Ok(CommitReceipt {
                version: state.sequence,
                committed_at,
            });
        }

        let version: u64 = state.sequence + 1;
        let mut changes: Vec<DocumentChange> = Vec::with_capacity(batch.writes.len());
        for op in &batch.writes {
            let path: &DocPath = op.path();
            let existing: Option<Value> = state.documents.get(path).map(|(data, _)| data.clone());
            match op.apply(existing.as_ref()) {
                Some(data) => {
                    state
                        .documents
                        .insert(path.clone(), (data.clone(), version));
                    changes.push(DocumentChange {
                        path: path.clone(),
                        data: Some(data),
                        version,
                    });
                }
                None => {
                    if state.documents.remove(path).is_some() {
                        changes.push(DocumentChange {
                            path: path.clone(),
                            data: None,
                            version,
                        });
                    }
                }
            }
        }
        state.sequence = version;
        // Published under the lock so subscribers see commit order.
        self.feed.publish(changes);
        drop(state);

        Ok(CommitReceipt {
            version,
            committed_at,
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.feed.subscribe()
    }
}
