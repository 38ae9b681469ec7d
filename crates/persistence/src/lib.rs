// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Document storage for shift requests, approvals and role records.
//!
//! Every store implements [`DocumentStore`]: path-addressed JSON documents,
//! atomic multi-document commits guarded by version preconditions, and a
//! change feed.
//!
//! ## Backends
//!
//! - [`MemoryStore`] keeps documents in process
//! - [`Persistence`] keeps documents in `SQLite` through Diesel, with schema
//!   managed by embedded migrations in `migrations/`
//!
//! ## Versions
//!
//! Each commit that writes anything takes the next value of one store-wide
//! sequence, and every document it writes carries that value. A deleted and
//! recreated document therefore never repeats a version.
//!
//! ## Testing Philosophy
//!
//! - The same contract checks run against both backends
//! - `SQLite` tests use isolated shared-cache in-memory databases

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use async_trait::async_trait;
use diesel::SqliteConnection;
use shiftdesk::{Document, WriteBatch};
use shiftdesk_domain::{DocPath, Timestamp};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod memory;
mod mutations;
mod queries;
mod store;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;
pub use memory::MemoryStore;
pub use store::{CHANGE_BUFFER_SIZE, ChangeFeed, CommitReceipt, DocumentChange, DocumentStore};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// `SQLite`-backed document store.
///
/// One connection is shared behind an async lock; commits run inside a
/// database transaction while the lock is held.
pub struct Persistence {
    conn: Mutex<SqliteConnection>,
    feed: ChangeFeed,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String =
            format!("file:memdb_shiftdesk_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;

        Ok(Self::from_connection(conn))
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;

        // Enable WAL mode for better read concurrency
        backend::sqlite::enable_wal_mode(&mut conn)?;

        info!(path = %path_str, "Opened document database");
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(),
        }
    }
}

#[async_trait]
impl DocumentStore for Persistence {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, PersistenceError> {
        let mut conn = self.conn.lock().await;
        queries::documents::load_document(&mut conn, path)
    }

    async fn get_many(&self, paths: &[DocPath]) -> Result<Vec<Option<Document>>, PersistenceError> {
        let mut conn = self.conn.lock().await;
        paths
            .iter()
            .map(|path| queries::documents::load_document(&mut conn, path))
            .collect()
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, PersistenceError> {
        let mut conn = self.conn.lock().await;
        queries::documents::list_collection(&mut conn, collection)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, PersistenceError> {
        let committed_at: Timestamp = Timestamp::now();
        let mut conn = self.conn.lock().await;
        let (version, changes) =
            mutations::commit::commit_batch(&mut conn, &batch, &committed_at.to_rfc3339())?;
        debug!(version, writes = changes.len(), "Committed batch");
        self.feed.publish(changes);
        drop(conn);
        Ok(CommitReceipt {
            version,
            committed_at,
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.feed.subscribe()
    }
}
