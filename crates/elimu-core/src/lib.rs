//! Elimu Core - Offline Resource Library
//!
//! This crate keeps learning resources available offline: it downloads
//! them into an application-private directory, persists an index of what
//! is on disk, and deletes or opens local copies. It also ranks catalog
//! resources for a learner.

mod error;
mod filename;
mod index;
mod library;
mod opener;
mod recommend;
mod source;
mod storage;
mod store;

pub use error::*;
pub use filename::*;
pub use index::*;
pub use library::*;
pub use opener::*;
pub use recommend::*;
pub use source::*;
pub use storage::*;
pub use store::*;

use elimu_types::{CoreEvent, Resource, Settings, StoreBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// The main Elimu core instance: settings plus a wired-up library
pub struct ElimuCore {
    settings: Settings,
    storage: Storage,
    library: Arc<ResourceLibrary>,
}

impl ElimuCore {
    /// Create a core rooted at `data_dir` using the HTTP source and the
    /// platform opener
    pub async fn new(data_dir: PathBuf) -> Result<Self, LibraryError> {
        let storage = Storage::new(data_dir.clone()).await?;
        let settings = storage.load_settings().await?;

        let store: Arc<dyn KeyValueStore> = match settings.store_backend {
            StoreBackend::Json => Arc::new(FileStore::new(data_dir.join("store")).await?),
            StoreBackend::Sqlite => Arc::new(SqliteStore::new(data_dir.join("elimu.db")).await?),
        };

        let source = HttpSource::new(
            &settings.user_agent,
            settings.request_timeout_secs.map(Duration::from_secs),
        )?;

        let library = ResourceLibrary::new(
            settings.storage_dir(&data_dir),
            store,
            Arc::new(source),
            Arc::new(SystemOpener),
        );

        info!(
            "Elimu core ready (data: {}, storage area: {}, index: {})",
            data_dir.display(),
            library.storage_dir().display(),
            settings.store_backend
        );

        Ok(Self {
            settings,
            storage,
            library: Arc::new(library),
        })
    }

    pub fn library(&self) -> Arc<ResourceLibrary> {
        Arc::clone(&self.library)
    }

    pub fn data_dir(&self) -> &Path {
        self.storage.data_dir()
    }

    /// Subscribe to library events
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.library.subscribe()
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Settings in effect for this instance
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Persist settings; they take effect the next time a core is created
    pub async fn save_settings(&self, settings: &Settings) -> Result<(), LibraryError> {
        self.storage.save_settings(settings).await
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    pub fn catalog_path(&self) -> PathBuf {
        self.settings.catalog_path(self.storage.data_dir())
    }

    pub async fn load_catalog(&self) -> Result<Vec<Resource>, LibraryError> {
        self.storage.load_catalog(&self.catalog_path()).await
    }

    /// Look a resource up in the catalog by id
    pub async fn find_resource(&self, id: &str) -> Result<Resource, LibraryError> {
        self.load_catalog()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| LibraryError::InvalidResource {
                id: id.to_string(),
                reason: format!("not in catalog {}", self.catalog_path().display()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn core_honours_saved_settings() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_path_buf();

        let core = ElimuCore::new(data_dir.clone()).await.unwrap();
        assert_eq!(core.library().storage_dir(), data_dir.join("ElimuPamoja"));
        assert!(data_dir.join("store").is_dir());

        let mut settings = core.settings().clone();
        settings.store_backend = StoreBackend::Sqlite;
        settings.storage_dir = Some(data_dir.join("offline"));
        core.save_settings(&settings).await.unwrap();

        let core = ElimuCore::new(data_dir.clone()).await.unwrap();
        assert_eq!(core.library().storage_dir(), data_dir.join("offline"));
        assert!(data_dir.join("elimu.db").exists());
        assert!(core.library().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_resource_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let core = ElimuCore::new(dir.path().to_path_buf()).await.unwrap();

        assert!(core.load_catalog().await.unwrap().is_empty());
        assert!(matches!(
            core.find_resource("r1").await,
            Err(LibraryError::InvalidResource { .. })
        ));
    }
}
