//! File-backed key-value store: one JSON document per key

use super::{validate_key, KeyValueStore};
use crate::error::LibraryError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores each key as `<dir>/<key>.json`
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a new file store, creating its directory if needed
    pub async fn new(dir: PathBuf) -> Result<Self, LibraryError> {
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LibraryError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LibraryError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LibraryError> {
        let path = self.path_for(key)?;
        // Write then rename so a crash never leaves a half-written value
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::new(dir.path().join("kv")).await.unwrap();
        assert_eq!(store.get("elimu_downloads").await.unwrap(), None);
        store.set("elimu_downloads", "[]").await.unwrap();
        drop(store);

        let reopened = FileStore::new(dir.path().join("kv")).await.unwrap();
        assert_eq!(
            reopened.get("elimu_downloads").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(!reopened.dir().join("elimu_downloads.json.tmp").exists());
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).await.unwrap();

        let err = store.set("../outside", "x").await.unwrap_err();
        assert!(matches!(err, LibraryError::Store(_)));
    }
}
