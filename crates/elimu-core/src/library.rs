//! Local resource library
//!
//! Downloads resources into the storage area, keeps the persisted index of
//! what is on disk, and deletes and opens local copies.
//!
//! Key rules:
//! - One index record per resource id; a new download replaces the old one
//! - The index is only written after the file has been fully streamed
//! - A failed transfer leaves the index alone; any partial file stays and
//!   is truncated by the next attempt
//! - Index and filesystem can drift apart; `open` checks the file exists

use crate::error::LibraryError;
use crate::filename::local_filename;
use crate::index::DownloadIndex;
use crate::opener::FileOpener;
use crate::source::{ResourceSource, SourceError};
use crate::store::KeyValueStore;
use elimu_types::{CoreEvent, LocalFile, Resource, ResourceState};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub struct ResourceLibrary {
    /// Directory holding every downloaded file
    storage_dir: PathBuf,
    index: DownloadIndex,
    source: Arc<dyn ResourceSource>,
    opener: Arc<dyn FileOpener>,
    event_tx: broadcast::Sender<CoreEvent>,
    /// Resource id -> number of transfers currently running
    in_flight: Mutex<HashMap<String, usize>>,
}

impl ResourceLibrary {
    pub fn new(
        storage_dir: PathBuf,
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn ResourceSource>,
        opener: Arc<dyn FileOpener>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);

        Self {
            storage_dir,
            index: DownloadIndex::new(store),
            source,
            opener,
            event_tx,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Subscribe to library events
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: CoreEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Create the storage area if it does not exist yet
    pub async fn ensure_storage_area(&self) -> Result<(), LibraryError> {
        fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|source| LibraryError::DirectoryCreateFailed {
                path: self.storage_dir.clone(),
                source,
            })
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// Download a resource into the storage area and record it.
    ///
    /// `on_progress` receives `written / expected` after every chunk when the
    /// provider announces a length, or a single `1.0` at the end when it
    /// does not. Values are forwarded as-is.
    pub async fn download<F>(&self, resource: &Resource, mut on_progress: F) -> Result<PathBuf, LibraryError>
    where
        F: FnMut(f64) + Send,
    {
        if resource.download_url.trim().is_empty() {
            return Err(LibraryError::InvalidResource {
                id: resource.id.clone(),
                reason: "missing download URL".to_string(),
            });
        }

        self.ensure_storage_area().await?;

        let filename = local_filename(&resource.title, &resource.download_url);
        let path = self.storage_dir.join(&filename);

        let _in_flight = InFlightGuard::enter(&self.in_flight, &resource.id);
        info!("Downloading {} from {} to {}", resource.id, resource.download_url, path.display());
        self.emit(CoreEvent::DownloadStarted {
            resource_id: resource.id.clone(),
        });

        let outcome = match self.transfer(resource, &path, &mut on_progress).await {
            Ok(written) => self.record(resource, &path, filename).await.map(|file| (file, written)),
            Err(e) => Err(e),
        };

        let (file, written) = match outcome {
            Ok(done) => done,
            Err(e) => {
                error!("Download {} failed: {}", resource.id, e);
                self.emit(CoreEvent::DownloadFailed {
                    resource_id: resource.id.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        info!("Download {} completed ({} bytes)", resource.id, written);
        self.emit(CoreEvent::DownloadCompleted { file });

        Ok(path)
    }

    /// Add the finished file to the index
    async fn record(&self, resource: &Resource, path: &Path, filename: String) -> Result<LocalFile, LibraryError> {
        let file = LocalFile::new(&resource.id, path.to_path_buf(), filename);
        self.index
            .upsert(file.clone())
            .await
            .map_err(|e| LibraryError::local(&resource.id, format!("cannot record download: {}", e)))?;
        Ok(file)
    }

    /// Stream the remote body into `path`, returning the bytes written
    async fn transfer<F>(&self, resource: &Resource, path: &Path, on_progress: &mut F) -> Result<u64, LibraryError>
    where
        F: FnMut(f64) + Send,
    {
        let id = resource.id.as_str();
        let remote_failure = |e: SourceError| LibraryError::remote(id, e.status, e.message);
        let disk_failure =
            |e: std::io::Error| LibraryError::local(id, format!("cannot write {}: {}", path.display(), e));

        let mut body = self
            .source
            .open(&resource.download_url)
            .await
            .map_err(remote_failure)?;

        let expected = body.expected_len.filter(|len| *len > 0);
        let mut file = File::create(path).await.map_err(disk_failure)?;
        let mut written: u64 = 0;

        while let Some(chunk) = body.chunks.next().await {
            let chunk = chunk.map_err(remote_failure)?;
            if chunk.is_empty() {
                continue;
            }

            file.write_all(&chunk).await.map_err(disk_failure)?;
            written += chunk.len() as u64;
            debug!("Download {}: {} / {:?} bytes", id, written, expected);

            self.emit(CoreEvent::DownloadProgress {
                resource_id: id.to_string(),
                written,
                expected,
            });

            if let Some(expected) = expected {
                on_progress((written as f64 / expected as f64).min(1.0));
            }
        }

        file.flush().await.map_err(disk_failure)?;
        file.sync_all().await.map_err(disk_failure)?;

        match expected {
            Some(expected) if written < expected => {
                return Err(LibraryError::remote(
                    id,
                    None,
                    format!("connection closed after {} of {} bytes", written, expected),
                ));
            }
            Some(_) => {}
            None => on_progress(1.0),
        }

        Ok(written)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Every downloaded file, in persisted order
    pub async fn list(&self) -> Result<Vec<LocalFile>, LibraryError> {
        self.index.load().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<LocalFile>, LibraryError> {
        self.index.find(id).await
    }

    /// Whether a resource is absent, being downloaded, or on disk
    pub async fn state(&self, resource_id: &str) -> Result<ResourceState, LibraryError> {
        if self.in_flight.lock().contains_key(resource_id) {
            return Ok(ResourceState::Downloading);
        }

        let present = self
            .index
            .load()
            .await?
            .iter()
            .any(|f| f.resource_id == resource_id);

        Ok(if present {
            ResourceState::Downloaded
        } else {
            ResourceState::NotDownloaded
        })
    }

    /// Records whose file is gone from disk
    pub async fn missing_files(&self) -> Result<Vec<LocalFile>, LibraryError> {
        let mut missing = Vec::new();
        for file in self.index.load().await? {
            if !fs::try_exists(&file.local_path).await? {
                missing.push(file);
            }
        }
        Ok(missing)
    }

    // ========================================================================
    // Delete / Open
    // ========================================================================

    /// Remove a downloaded file and its record. Unknown ids are ignored.
    pub async fn delete(&self, id: &str) -> Result<(), LibraryError> {
        let Some(file) = self.index.find(id).await? else {
            debug!("Delete {}: no such local file", id);
            return Ok(());
        };

        match fs::remove_file(&file.local_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Delete {}: {} was already gone", id, file.local_path.display());
            }
            Err(e) => return Err(e.into()),
        }

        self.index.remove(id).await?;
        info!("Deleted local file {}", id);
        self.emit(CoreEvent::FileRemoved { id: id.to_string() });

        Ok(())
    }

    /// Hand a downloaded file to the platform opener
    pub async fn open(&self, id: &str) -> Result<PathBuf, LibraryError> {
        let file = self
            .index
            .find(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;

        if !fs::try_exists(&file.local_path).await? {
            warn!("Open {}: {} is missing", id, file.local_path.display());
            return Err(LibraryError::FileMissing {
                id: file.id,
                path: file.local_path,
            });
        }

        self.opener.open(&file.local_path).await?;
        Ok(file.local_path)
    }
}

/// Marks a resource as in flight until dropped
struct InFlightGuard<'a> {
    map: &'a Mutex<HashMap<String, usize>>,
    resource_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn enter(map: &'a Mutex<HashMap<String, usize>>, resource_id: &str) -> Self {
        *map.lock().entry(resource_id.to_string()).or_insert(0) += 1;
        Self {
            map,
            resource_id: resource_id.to_string(),
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock();
        if let Some(count) = map.get_mut(&self.resource_id) {
            *count -= 1;
            if *count == 0 {
                map.remove(&self.resource_id);
            }
        }
    }
}
