//! Shared types for Elimu Pamoja
//!
//! This crate contains the data structures shared between the offline
//! library core and the CLI.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Resource Types
// ============================================================================

/// A remote learning resource (past paper, notes, ...)
///
/// Field names follow the records kept by the document database, so a
/// catalog exported from it deserializes as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub subject: String,
    pub grade: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    pub curriculum: Curriculum,
    pub download_url: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub premium: bool,
}

impl Resource {
    /// Build a minimal resource for an ad-hoc URL
    pub fn adhoc(id: impl Into<String>, title: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ResourceKind::Notes,
            subject: String::new(),
            grade: 0,
            year: None,
            curriculum: Curriculum::Cbc,
            download_url: download_url.into(),
            file_size: 0,
            premium: false,
        }
    }
}

/// Kind of learning material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    PastPaper,
    Notes,
    Topical,
    Mock,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::PastPaper => "past paper",
            ResourceKind::Notes => "notes",
            ResourceKind::Topical => "topical",
            ResourceKind::Mock => "mock",
        };
        f.write_str(s)
    }
}

/// Curriculum a resource belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Curriculum {
    Kcpe,
    Kcse,
    Cbc,
}

impl fmt::Display for Curriculum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Curriculum::Kcpe => "KCPE",
            Curriculum::Kcse => "KCSE",
            Curriculum::Cbc => "CBC",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Local Library Types
// ============================================================================

/// A resource that has been downloaded to the storage area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFile {
    /// Same as `resource_id`; one record per resource
    pub id: String,
    pub resource_id: String,
    pub local_path: PathBuf,
    /// Epoch milliseconds
    pub downloaded_at: i64,
    pub filename: String,
}

impl LocalFile {
    pub fn new(resource_id: &str, local_path: PathBuf, filename: String) -> Self {
        Self {
            id: resource_id.to_string(),
            resource_id: resource_id.to_string(),
            local_path,
            downloaded_at: Utc::now().timestamp_millis(),
            filename,
        }
    }

    pub fn downloaded_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.downloaded_at).single()
    }
}

/// Local state of a resource as seen by the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    NotDownloaded,
    Downloading,
    Downloaded,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceState::NotDownloaded => "not downloaded",
            ResourceState::Downloading => "downloading",
            ResourceState::Downloaded => "downloaded",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Recommendation Types
// ============================================================================

/// A scored suggestion of what to study next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub resource_id: String,
    /// 0-100
    pub score: u8,
    pub reason: String,
}

// ============================================================================
// Settings Types
// ============================================================================

/// Backend used for the persisted download index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Json => f.write_str("json"),
            StoreBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where downloaded files live (None = `<data_dir>/ElimuPamoja`)
    pub storage_dir: Option<PathBuf>,
    /// Resource catalog (None = `<data_dir>/catalog.json`)
    pub catalog_path: Option<PathBuf>,
    pub store_backend: StoreBackend,
    /// Whole-request timeout; transport default when unset
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: None,
            catalog_path: None,
            store_backend: StoreBackend::Json,
            request_timeout_secs: None,
            user_agent: format!("elimu/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Settings {
    pub fn storage_dir(&self, data_dir: &Path) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("ElimuPamoja"))
    }

    pub fn catalog_path(&self, data_dir: &Path) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| data_dir.join("catalog.json"))
    }

    /// Names accepted by [`Settings::get`] and [`Settings::set`]
    pub const KEYS: &'static [&'static str] = &[
        "storage_dir",
        "catalog_path",
        "store_backend",
        "request_timeout_secs",
        "user_agent",
    ];

    /// Read a setting as text; `None` for unknown keys
    pub fn get(&self, key: &str) -> Option<String> {
        let unset = || "(unset)".to_string();
        let value = match key {
            "storage_dir" => self.storage_dir.as_ref().map(|p| p.display().to_string()).unwrap_or_else(unset),
            "catalog_path" => self.catalog_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(unset),
            "store_backend" => self.store_backend.to_string(),
            "request_timeout_secs" => self.request_timeout_secs.map(|s| s.to_string()).unwrap_or_else(unset),
            "user_agent" => self.user_agent.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Update a setting from text. An empty value clears optional settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        match key {
            "storage_dir" => self.storage_dir = non_empty(value).map(PathBuf::from),
            "catalog_path" => self.catalog_path = non_empty(value).map(PathBuf::from),
            "store_backend" => self.store_backend = value.parse()?,
            "request_timeout_secs" => {
                self.request_timeout_secs = match non_empty(value) {
                    Some(v) => Some(v.parse().map_err(|_| format!("not a number of seconds: {}", v))?),
                    None => None,
                }
            }
            "user_agent" => {
                if value.is_empty() {
                    return Err("user_agent cannot be empty".to_string());
                }
                self.user_agent = value.to_string();
            }
            _ => return Err(format!("unknown setting: {}", key)),
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Default data directory for the application
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("elimu"))
        .unwrap_or_else(|| PathBuf::from(".elimu"))
}

// ============================================================================
// Event Types
// ============================================================================

/// Events emitted by the core to front-ends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    DownloadStarted {
        resource_id: String,
    },
    DownloadProgress {
        resource_id: String,
        written: u64,
        expected: Option<u64>,
    },
    DownloadCompleted {
        file: LocalFile,
    },
    DownloadFailed {
        resource_id: String,
        error: String,
    },
    FileRemoved {
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_uses_document_field_names() {
        let json = r#"{
            "id": "r1",
            "title": "KCSE Maths 2019",
            "type": "past_paper",
            "subject": "Mathematics",
            "grade": 12,
            "year": 2019,
            "curriculum": "KCSE",
            "downloadUrl": "https://x/a.pdf",
            "fileSize": 1000,
            "premium": false
        }"#;

        let resource: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.kind, ResourceKind::PastPaper);
        assert_eq!(resource.curriculum, Curriculum::Kcse);
        assert_eq!(resource.download_url, "https://x/a.pdf");
        assert_eq!(resource.year, Some(2019));
    }

    #[test]
    fn local_file_serializes_camel_case() {
        let file = LocalFile {
            id: "r1".into(),
            resource_id: "r1".into(),
            local_path: PathBuf::from("/tmp/a.pdf"),
            downloaded_at: 1_700_000_000_000,
            filename: "a.pdf".into(),
        };

        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["resourceId"], "r1");
        assert_eq!(value["localPath"], "/tmp/a.pdf");
        assert_eq!(value["downloadedAt"], 1_700_000_000_000i64);
        assert!(file.downloaded_at_utc().is_some());
    }

    #[test]
    fn settings_set_and_get() {
        let mut settings = Settings::default();
        settings.set("store_backend", "SQLite").unwrap();
        settings.set("request_timeout_secs", "30").unwrap();
        assert_eq!(settings.store_backend, StoreBackend::Sqlite);
        assert_eq!(settings.get("request_timeout_secs").as_deref(), Some("30"));

        settings.set("request_timeout_secs", "").unwrap();
        assert_eq!(settings.request_timeout_secs, None);

        assert!(settings.set("request_timeout_secs", "soon").is_err());
        assert!(settings.set("colour", "blue").is_err());
        assert!(settings.get("colour").is_none());
    }

    #[test]
    fn settings_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"store_backend":"sqlite"}"#).unwrap();
        assert_eq!(settings.store_backend, StoreBackend::Sqlite);
        assert!(settings.user_agent.starts_with("elimu/"));

        let data_dir = Path::new("/data");
        assert_eq!(settings.storage_dir(data_dir), PathBuf::from("/data/ElimuPamoja"));
        assert_eq!(settings.catalog_path(data_dir), PathBuf::from("/data/catalog.json"));
    }
}
