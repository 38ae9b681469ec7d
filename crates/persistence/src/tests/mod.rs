// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use serde_json::{Value, json};
use shiftdesk::{WriteBatch, WriteOp};
use shiftdesk_domain::DocPath;

use crate::{MemoryStore, Persistence};

pub fn create_test_memory_store() -> MemoryStore {
    MemoryStore::new()
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("in-memory database")
}

pub fn role_path(id: &str) -> DocPath {
    DocPath::user_store_role(id).unwrap()
}

pub fn approval_path(id: &str) -> DocPath {
    DocPath::approval(id).unwrap()
}

pub fn role_body(role: &str) -> Value {
    json!({ "userId": "u1", "storeId": "s1", "role": role })
}

/// A batch creating `path` with `data`, requiring it to be absent.
pub fn create_batch(path: &DocPath, data: Value) -> WriteBatch {
    WriteBatch::new()
        .require(path.clone(), None)
        .write(WriteOp::Set {
            path: path.clone(),
            data,
        })
}
