//! Hand a downloaded file to the platform's default handler

use crate::error::LibraryError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

#[async_trait]
pub trait FileOpener: Send + Sync {
    async fn open(&self, path: &Path) -> Result<(), LibraryError>;
}

/// Opens files with `open`, `xdg-open` or `start` depending on the OS
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(path: &Path) -> Command {
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            cmd
        }
        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(path);
            cmd
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        }
    }
}

#[async_trait]
impl FileOpener for SystemOpener {
    async fn open(&self, path: &Path) -> Result<(), LibraryError> {
        info!("Opening {}", path.display());

        let status = Self::command(path)
            .status()
            .await
            .map_err(|e| LibraryError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(LibraryError::Open {
                path: path.to_path_buf(),
                message: format!("opener exited with {}", status),
            })
        }
    }
}
