//! Storage for settings and the resource catalog (JSON files)

use crate::error::LibraryError;
use elimu_types::{Resource, Settings};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

const SETTINGS_FILE: &str = "settings.json";

/// Storage manager for application data files
#[derive(Clone, Debug)]
pub struct Storage {
    /// Data directory
    data_dir: PathBuf,
}

impl Storage {
    /// Create a new storage instance
    pub async fn new(data_dir: PathBuf) -> Result<Self, LibraryError> {
        fs::create_dir_all(&data_dir).await?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Load settings, falling back to defaults when absent or unreadable
    pub async fn load_settings(&self) -> Result<Settings, LibraryError> {
        let path = self.data_dir.join(SETTINGS_FILE);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Ignoring unreadable settings at {}: {}", path.display(), e);
                Ok(Settings::default())
            }
        }
    }

    /// Save settings
    pub async fn save_settings(&self, settings: &Settings) -> Result<(), LibraryError> {
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(self.data_dir.join(SETTINGS_FILE), content).await?;
        Ok(())
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Load the resource catalog; a missing file is an empty catalog
    pub async fn load_catalog(&self, path: &Path) -> Result<Vec<Resource>, LibraryError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No catalog at {}", path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elimu_types::StoreBackend;

    #[tokio::test]
    async fn settings_round_trip_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("data")).await.unwrap();

        assert_eq!(storage.load_settings().await.unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.store_backend = StoreBackend::Sqlite;
        storage.save_settings(&settings).await.unwrap();
        assert_eq!(storage.load_settings().await.unwrap(), settings);

        fs::write(storage.data_dir().join(SETTINGS_FILE), "garbage").await.unwrap();
        assert_eq!(storage.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn catalog_loading() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf()).await.unwrap();
        let path = dir.path().join("catalog.json");

        assert!(storage.load_catalog(&path).await.unwrap().is_empty());

        fs::write(
            &path,
            r#"[{"id":"r1","title":"Notes","type":"notes","subject":"Biology","grade":11,
                "curriculum":"CBC","downloadUrl":"https://x/a.pdf","fileSize":10,"premium":false}]"#,
        )
        .await
        .unwrap();
        let catalog = storage.load_catalog(&path).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id, "r1");

        fs::write(&path, "[{").await.unwrap();
        assert!(matches!(
            storage.load_catalog(&path).await,
            Err(LibraryError::Serialization(_))
        ));
    }
}
