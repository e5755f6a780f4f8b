//! Persisted index of downloaded files
//!
//! The whole index is one JSON array stored under a single key. Every
//! mutation reads, modifies and rewrites it. Mutations made through the same
//! `DownloadIndex` are serialized so they cannot drop each other's records.

use crate::error::LibraryError;
use crate::store::KeyValueStore;
use elimu_types::LocalFile;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Key the index is stored under
pub const DOWNLOADS_KEY: &str = "elimu_downloads";

pub struct DownloadIndex {
    store: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
}

impl DownloadIndex {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DOWNLOADS_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// All records, in persisted order
    pub async fn load(&self) -> Result<Vec<LocalFile>, LibraryError> {
        match self.store.get(&self.key).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn find(&self, id: &str) -> Result<Option<LocalFile>, LibraryError> {
        Ok(self.load().await?.into_iter().find(|f| f.id == id))
    }

    /// Insert a record, replacing any record with the same id
    pub async fn upsert(&self, file: LocalFile) -> Result<(), LibraryError> {
        let _guard = self.write_lock.lock().await;

        let mut files = self.load().await?;
        files.retain(|f| f.id != file.id);
        files.push(file);
        self.save(&files).await
    }

    /// Remove a record; returns it if it was present
    pub async fn remove(&self, id: &str) -> Result<Option<LocalFile>, LibraryError> {
        let _guard = self.write_lock.lock().await;

        let mut files = self.load().await?;
        let Some(pos) = files.iter().position(|f| f.id == id) else {
            return Ok(None);
        };
        let removed = files.remove(pos);
        self.save(&files).await?;
        Ok(Some(removed))
    }

    async fn save(&self, files: &[LocalFile]) -> Result<(), LibraryError> {
        let json = serde_json::to_string(files)?;
        self.store.set(&self.key, &json).await?;
        debug!("Saved download index with {} record(s)", files.len());
        Ok(())
    }
}
