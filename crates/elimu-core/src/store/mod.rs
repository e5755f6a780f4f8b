//! Key-value persistence for the download index
//!
//! The library only needs `get` and `set` on string keys. Three backends:
//! - `MemoryStore` for tests and throwaway sessions
//! - `FileStore`, one file per key under a directory
//! - `SqliteStore`, a single `kv` table

mod file;
mod sqlite;

pub use file::*;
pub use sqlite::*;

use crate::error::LibraryError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Durable string-keyed storage that survives restarts
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, LibraryError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), LibraryError>;
}

/// In-process store, nothing is written to disk
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LibraryError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LibraryError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reject keys that could escape a directory or break a file name
pub(crate) fn validate_key(key: &str) -> Result<(), LibraryError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(LibraryError::Store(format!("invalid key: {:?}", key)))
    }
}
