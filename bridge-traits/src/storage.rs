//! Document Source and File System Abstractions

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A markdown document discovered in a remote content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// Path relative to the source root, `/`-separated (e.g. `music/jazz/song.md`)
    pub path: String,
    /// File name component of `path`
    pub name: String,
    /// Size in bytes, when the source reports it
    pub size: Option<u64>,
    /// Content hash reported by the source (git blob sha for GitHub)
    pub sha: Option<String>,
}

impl RemoteDocument {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            size: None,
            sha: None,
        }
    }

    /// Whether the entry names a markdown document.
    pub fn is_markdown(&self) -> bool {
        self.name.ends_with(".md")
    }
}

/// Remote source of truth for content documents.
///
/// Implementations enumerate markdown files recursively and fetch their raw
/// UTF-8 content. Errors should distinguish retryable network failures from
/// authorization failures so the sync engine can report them accurately.
///
/// # Example
///
/// ```ignore
/// async fn count(source: &dyn DocumentSource) -> Result<usize> {
///     Ok(source.list_documents().await?.len())
/// }
/// ```
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable name used in logs (e.g. `github:owner/repo`).
    fn name(&self) -> String;

    /// Enumerate every markdown document below the source root.
    async fn list_documents(&self) -> Result<Vec<RemoteDocument>>;

    /// Fetch the raw content of one document.
    async fn fetch_document(&self, path: &str) -> Result<String>;
}

/// File system access trait
///
/// Used for the local content mirror. Paths are absolute or relative to the
/// process working directory.
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a directory and all parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to file (overwrites existing), creating parent directories
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a single file; succeeds when the file is already gone
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Delete a directory and all its contents
    async fn delete_dir_all(&self, path: &Path) -> Result<()>;

    /// List entries in a directory (non-recursive)
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Whether the path is a directory
    async fn is_directory(&self, path: &Path) -> Result<bool>;

    /// Rename a file or directory
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Read a file as UTF-8 text
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            crate::error::BridgeError::OperationFailed(format!(
                "Invalid UTF-8 in {}: {}",
                path.display(),
                e
            ))
        })
    }
}
