// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::SqliteConnection;
use shiftdesk::Document;
use shiftdesk_domain::DocPath;

use crate::data_models::DocumentRow;
use crate::diesel_schema::{documents, store_sequence};
use crate::error::PersistenceError;

/// Loads the row stored at `path`, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_row(
    conn: &mut SqliteConnection,
    path: &DocPath,
) -> Result<Option<DocumentRow>, PersistenceError> {
    let row: Option<DocumentRow> = documents::table
        .filter(documents::path.eq(path.as_str()))
        .select(DocumentRow::as_select())
        .first::<DocumentRow>(conn)
        .optional()?;
    Ok(row)
}

/// Loads the document stored at `path`, if any.
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt.
pub fn load_document(
    conn: &mut SqliteConnection,
    path: &DocPath,
) -> Result<Option<Document>, PersistenceError> {
    load_row(conn, path)?
        .map(DocumentRow::into_document)
        .transpose()
}

/// Lists the documents stored directly in `collection`, ordered by path.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn list_collection(
    conn: &mut SqliteConnection,
    collection: &str,
) -> Result<Vec<Document>, PersistenceError> {
    let rows: Vec<DocumentRow> = documents::table
        .filter(documents::collection.eq(collection))
        .order(documents::path.asc())
        .select(DocumentRow::as_select())
        .load::<DocumentRow>(conn)?;
    rows.into_iter().map(DocumentRow::into_document).collect()
}

/// Reads the store-wide commit sequence.
///
/// # Errors
///
/// Returns an error if the query fails or the sequence is negative.
pub fn current_sequence(conn: &mut SqliteConnection) -> Result<u64, PersistenceError> {
    let value: i64 = store_sequence::table
        .filter(store_sequence::id.eq(1))
        .select(store_sequence::value)
        .first::<i64>(conn)?;
    u64::try_from(value).map_err(|e| PersistenceError::QueryFailed(e.to_string()))
}
