//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::FileSystemAccess,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation backing the local content mirror.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NotFound(path.display().to_string())
            } else {
                Self::map_io_error(e)
            }
        })?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent).await?;
            }
        }

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = ?path, "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn delete_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path).await {
            Ok(()) => {
                debug!(path = ?path, "Deleted directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(Self::map_io_error)?
        {
            entries.push(entry.path());
        }

        entries.sort();
        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn is_directory(&self, path: &Path) -> Result<bool> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;
        Ok(metadata.is_dir())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).await.map_err(Self::map_io_error)?;
        debug!(from = ?from, to = ?to, "Renamed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parents_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let file = dir.path().join("music/jazz/song.md");

        fs.write_file(&file, Bytes::from("Hello, World!"))
            .await
            .unwrap();

        assert!(fs.exists(&file).await.unwrap());
        assert_eq!(fs.read_to_string(&file).await.unwrap(), "Hello, World!");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();

        let result = fs.read_file(&dir.path().join("missing.md")).await;
        assert!(matches!(result, Err(BridgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let file = dir.path().join("a.md");
        fs.write_file(&file, Bytes::from("x")).await.unwrap();

        fs.delete_file(&file).await.unwrap();
        assert!(!fs.exists(&file).await.unwrap());
        assert!(fs.delete_file(&file).await.is_ok(), "Second delete should succeed");
    }

    #[tokio::test]
    async fn test_delete_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();

        let result = fs.delete_dir_all(&dir.path().join("nope")).await;
        assert!(result.is_ok(), "Deleting a missing directory should succeed");
    }

    #[tokio::test]
    async fn test_list_and_rename() {
        let dir = tempfile::tempdir().unwrap();
        let fs = TokioFileSystem::new();
        let staging = dir.path().join("staging");
        fs.write_file(&staging.join("b.md"), Bytes::from("b"))
            .await
            .unwrap();
        fs.write_file(&staging.join("a.md"), Bytes::from("a"))
            .await
            .unwrap();

        let listed = fs.list_directory(&staging).await.unwrap();
        assert_eq!(listed, vec![staging.join("a.md"), staging.join("b.md")]);

        let live = dir.path().join("content");
        fs.rename(&staging, &live).await.unwrap();
        assert!(fs.is_directory(&live).await.unwrap());
        assert!(!fs.exists(&staging).await.unwrap());
    }
}
