// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use serde_json::Value;
use shiftdesk::WriteBatch;
use shiftdesk_domain::DocPath;
use tracing::debug;

use crate::data_models::{DocumentRow, NewDocumentRow};
use crate::diesel_schema::{documents, store_sequence};
use crate::error::PersistenceError;
use crate::queries::documents::{current_sequence, load_row};
use crate::store::DocumentChange;

/// Commits `batch` inside one `SQLite` transaction.
///
/// Every precondition is checked before any write. All writes of the batch
/// share the next commit sequence number.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `batch` - The guarded writes
/// * `committed_at` - RFC 3339 commit instant stored on written rows
///
/// # Returns
///
/// The commit version and the changes it applied. A batch without writes
/// returns the current sequence and no changes.
///
/// # Errors
///
/// Returns `Contention` if a precondition fails. The transaction is rolled
/// back on any error, so nothing is written.
pub fn commit_batch(
    conn: &mut SqliteConnection,
    batch: &WriteBatch,
    committed_at: &str,
) -> Result<(u64, Vec<DocumentChange>), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        for precondition in &batch.preconditions {
            let found: Option<u64> = stored_version(load_row(conn, &precondition.path)?)?;
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

        let current: u64 = current_sequence(conn)?;
        if batch.writes.is_empty() {
            return Ok((current, Vec::new()));
        }
        let next: u64 = current + 1;
        let stored: i64 =
            i64::try_from(next).map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;

        let mut changes: Vec<DocumentChange> = Vec::with_capacity(batch.writes.len());
        for op in &batch.writes {
            let path: &DocPath = op.path();
            let existing: Option<Value> = load_row(conn, path)?
                .map(|row| serde_json::from_str::<Value>(&row.data))
                .transpose()?;
            let existed: bool = existing.is_some();
            match op.apply(existing.as_ref()) {
                Some(data) => {
                    let row: NewDocumentRow<'_> = NewDocumentRow {
                        path: path.as_str(),
                        collection: path.collection(),
                        doc_id: path.id(),
                        data: serde_json::to_string(&data)?,
                        version: stored,
                        updated_at: committed_at,
                    };
                    diesel::replace_into(documents::table)
                        .values(&row)
                        .execute(conn)?;
                    changes.push(DocumentChange {
                        path: path.clone(),
                        data: Some(data),
                        version: next,
                    });
                }
                None => {
                    diesel::delete(documents::table.filter(documents::path.eq(path.as_str())))
                        .execute(conn)?;
                    if existed {
                        changes.push(DocumentChange {
                            path: path.clone(),
                            data: None,
                            version: next,
                        });
                    }
                }
            }
        }

        diesel::update(store_sequence::table.filter(store_sequence::id.eq(1)))
            .set(store_sequence::value.eq(stored))
            .execute(conn)?;

        Ok((next, changes))
    })
}

fn stored_version(row: Option<DocumentRow>) -> Result<Option<u64>, PersistenceError> {
    row.map(|row| {
        u64::try_from(row.version).map_err(|e| PersistenceError::CorruptDocument {
            path: row.path.clone(),
            reason: e.to_string(),
        })
    })
    .transpose()
}
