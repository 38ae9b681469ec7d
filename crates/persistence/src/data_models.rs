// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use serde_json::Value;
use shiftdesk::Document;
use shiftdesk_domain::DocPath;

use crate::diesel_schema::documents;
use crate::error::PersistenceError;

/// A row of the `documents` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRow {
    pub path: String,
    pub collection: String,
    pub doc_id: String,
    pub data: String,
    pub version: i64,
    pub updated_at: String,
}

impl DocumentRow {
    /// Converts the row back into a document.
    ///
    /// # Errors
    ///
    /// Returns `CorruptDocument` if the path, body or version is invalid.
    pub fn into_document(self) -> Result<Document, PersistenceError> {
        let corrupt = |reason: String| PersistenceError::CorruptDocument {
            path: self.path.clone(),
            reason,
        };
        let path: DocPath = DocPath::parse(&self.path).map_err(|e| corrupt(e.to_string()))?;
        let data: Value = serde_json::from_str(&self.data).map_err(|e| corrupt(e.to_string()))?;
        let version: u64 = u64::try_from(self.version).map_err(|e| corrupt(e.to_string()))?;
        Ok(Document {
            path,
            data,
            version,
        })
    }
}

/// An insertable `documents` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocumentRow<'a> {
    pub path: &'a str,
    pub collection: &'a str,
    pub doc_id: &'a str,
    pub data: String,
    pub version: i64,
    pub updated_at: &'a str,
}
