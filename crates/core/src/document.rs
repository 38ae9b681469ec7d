// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Documents and atomic write batches.
//!
//! Transitions in this crate do not touch storage. They describe their
//! effect as a [`WriteBatch`]: version preconditions plus writes that a store
//! commits all-or-nothing.

use crate::error::CoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shiftdesk_domain::DocPath;
use std::collections::BTreeMap;

/// A stored document.
///
/// `version` is the store-wide commit sequence number of the commit that
/// last wrote the document, so a deleted and recreated document never
/// reuses a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// The document's path.
    pub path: DocPath,
    /// The document body.
    pub data: Value,
    /// Commit sequence of the last write.
    pub version: u64,
}

impl Document {
    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDocument` if the body does not decode.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        serde_json::from_value(self.data.clone()).map_err(|err| CoreError::MalformedDocument {
            path: self.path.to_string(),
            reason: err.to_string(),
        })
    }
}

/// One write within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Replaces the document.
    Set {
        /// Target path.
        path: DocPath,
        /// New body.
        data: Value,
    },
    /// Shallow-merges top-level fields, creating the document if absent.
    Merge {
        /// Target path.
        path: DocPath,
        /// Fields to overwrite.
        fields: Map<String, Value>,
    },
    /// Removes the document. Removing an absent document is not an error.
    Delete {
        /// Target path.
        path: DocPath,
    },
}

impl WriteOp {
    /// The path this write targets.
    #[must_use]
    pub const fn path(&self) -> &DocPath {
        match self {
            Self::Set { path, .. } | Self::Merge { path, .. } | Self::Delete { path } => path,
        }
    }

    /// Computes the document body after this write.
    ///
    /// Returns `None` when the document no longer exists.
    #[must_use]
    pub fn apply(&self, current: Option<&Value>) -> Option<Value> {
        match self {
            Self::Set { data, .. } => Some(data.clone()),
            Self::Merge { fields, .. } => Some(merge_fields(current, fields)),
            Self::Delete { .. } => None,
        }
    }
}

/// Overwrites the top-level `fields` of `current`.
///
/// A missing or non-object `current` is treated as an empty object.
#[must_use]
pub fn merge_fields(current: Option<&Value>, fields: &Map<String, Value>) -> Value {
    let mut merged: Map<String, Value> = match current {
        Some(Value::Object(existing)) => existing.clone(),
        _ => Map::new(),
    };
    for (key, value) in fields {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

/// Serializes `value` into top-level fields for a merge.
///
/// # Errors
///
/// Returns `MalformedDocument` if `value` does not serialize to an object.
pub fn to_fields<T: Serialize>(path: &DocPath, value: &T) -> Result<Map<String, Value>, CoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(CoreError::MalformedDocument {
            path: path.to_string(),
            reason: format!("expected an object, found {other}"),
        }),
        Err(err) => Err(CoreError::MalformedDocument {
            path: path.to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Requires a document to be at an exact version, or absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    /// The guarded path.
    pub path: DocPath,
    /// Required version; `None` requires the document to be absent.
    pub expected_version: Option<u64>,
}

/// An all-or-nothing set of writes guarded by preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteBatch {
    /// Checked before any write is applied.
    pub preconditions: Vec<Precondition>,
    /// Applied in order.
    pub writes: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            preconditions: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Adds a precondition.
    #[must_use]
    pub fn require(mut self, path: DocPath, expected_version: Option<u64>) -> Self {
        self.preconditions.push(Precondition {
            path,
            expected_version,
        });
        self
    }

    /// Adds a write.
    #[must_use]
    pub fn write(mut self, op: WriteOp) -> Self {
        self.writes.push(op);
        self
    }

    /// Whether the batch writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Documents read for a transition, keyed by path.
///
/// A path mapped to `None` was read and found absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadSet {
    documents: BTreeMap<DocPath, Option<Document>>,
}

impl ReadSet {
    /// Creates an empty read set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
        }
    }

    /// Records the result of reading `path`.
    pub fn insert(&mut self, path: DocPath, document: Option<Document>) {
        self.documents.insert(path, document);
    }

    /// The document at `path`, if it was read and exists.
    #[must_use]
    pub fn get(&self, path: &DocPath) -> Option<&Document> {
        self.documents.get(path).and_then(Option::as_ref)
    }

    /// The version observed at `path`; `None` if absent or unread.
    #[must_use]
    pub fn version(&self, path: &DocPath) -> Option<u64> {
        self.get(path).map(|doc| doc.version)
    }

    /// Whether `path` was read.
    #[must_use]
    pub fn contains(&self, path: &DocPath) -> bool {
        self.documents.contains_key(path)
    }
}

impl FromIterator<(DocPath, Option<Document>)> for ReadSet {
    fn from_iter<I: IntoIterator<Item = (DocPath, Option<Document>)>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}
