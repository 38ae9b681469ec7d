// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The document store contract.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use shiftdesk::{Document, WriteBatch};
use shiftdesk_domain::{DocPath, Timestamp};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::PersistenceError;

/// Maximum number of changes buffered per subscriber.
pub const CHANGE_BUFFER_SIZE: usize = 256;

/// One applied write, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChange {
    /// The written path.
    pub path: DocPath,
    /// The body after the write; `None` when the document was deleted.
    pub data: Option<Value>,
    /// The commit version.
    pub version: u64,
}

impl DocumentChange {
    /// Whether the change touches a document directly in `collection`.
    #[must_use]
    pub fn in_collection(&self, collection: &str) -> bool {
        self.path.in_collection(collection)
    }
}

/// The result of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    /// The version every written document now carries.
    pub version: u64,
    /// When the commit was applied.
    pub committed_at: Timestamp,
}

/// A document database with atomic guarded commits.
///
/// Implementations are shared between engines behind an `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, PersistenceError>;

    /// Reads several documents, in the order given.
    ///
    /// # Errors
    ///
    /// Returns an error if any read fails.
    async fn get_many(&self, paths: &[DocPath]) -> Result<Vec<Option<Document>>, PersistenceError> {
        let mut found: Vec<Option<Document>> = Vec::with_capacity(paths.len());
        for path in paths {
            found.push(self.get(path).await?);
        }
        Ok(found)
    }

    /// Lists the documents stored directly in `collection`, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError>;

    /// Applies `batch` all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `Contention` if a precondition does not hold, or another error
    /// if the store fails. Nothing is written on error.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, PersistenceError>;

    /// Subscribes to every change committed after this call.
    fn subscribe(&self) -> broadcast::Receiver<DocumentChange>;
}

/// Fans committed changes out to subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<DocumentChange>,
}

impl ChangeFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANGE_BUFFER_SIZE);
        Self { tx }
    }

    /// Publishes `changes` in commit order.
    ///
    /// Changes are dropped when nobody is subscribed.
    pub fn publish(&self, changes: Vec<DocumentChange>) {
        for change in changes {
            match self.tx.send(change) {
                Ok(receivers) => debug!(receivers, "Published document change"),
                Err(_) => debug!("No subscribers for document change"),
            }
        }
    }

    /// Subscribes to future changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
