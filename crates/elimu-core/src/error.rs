//! Error types for the offline library

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the offline library
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Transfer failed for {resource_id}: {message}")]
    TransferFailed {
        resource_id: String,
        /// HTTP status when the server answered with a non-2xx response
        status: Option<u16>,
        /// False when the failure was local (disk, index) rather than remote
        retryable: bool,
        message: String,
    },

    #[error("File for {id} is missing from disk: {}", .path.display())]
    FileMissing { id: String, path: PathBuf },

    #[error("Could not create storage area {}: {source}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid resource {id}: {reason}")]
    InvalidResource { id: String, reason: String },

    #[error("Local file not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not open {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Failure on the remote side: network errors and 5xx are retryable
    pub(crate) fn remote(resource_id: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        LibraryError::TransferFailed {
            resource_id: resource_id.to_string(),
            status,
            retryable: status.map_or(true, |s| s >= 500),
            message: message.into(),
        }
    }

    /// Failure writing on this device; retrying will not help
    pub(crate) fn local(resource_id: &str, message: impl Into<String>) -> Self {
        LibraryError::TransferFailed {
            resource_id: resource_id.to_string(),
            status: None,
            retryable: false,
            message: message.into(),
        }
    }

    /// Check if a caller retry is worth attempting
    pub fn is_retryable(&self) -> bool {
        matches!(self, LibraryError::TransferFailed { retryable: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_transfer_failures() {
        assert!(LibraryError::remote("r1", None, "connection reset").is_retryable());
        assert!(LibraryError::remote("r1", Some(503), "unavailable").is_retryable());
        assert!(!LibraryError::remote("r1", Some(404), "not found").is_retryable());
        assert!(!LibraryError::local("r1", "disk full").is_retryable());

        let gone = LibraryError::FileMissing {
            id: "r1".into(),
            path: PathBuf::from("/tmp/a.pdf"),
        };
        assert!(!gone.is_retryable());
    }
}
