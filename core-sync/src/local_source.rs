//! Document source backed by a local directory tree.
//!
//! Lets the store be rebuilt offline from a checkout of the content
//! repository.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::{DocumentSource, FileSystemAccess, RemoteDocument};
use core_library::content::resolve_under;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub struct LocalDirectorySource {
    fs: Arc<dyn FileSystemAccess>,
    root: PathBuf,
}

impl LocalDirectorySource {
    pub fn new(fs: Arc<dyn FileSystemAccess>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl DocumentSource for LocalDirectorySource {
    fn name(&self) -> String {
        format!("local:{}", self.root.display())
    }

    async fn list_documents(&self) -> Result<Vec<RemoteDocument>> {
        if !self.fs.exists(&self.root).await? {
            return Err(BridgeError::NotFound(self.root.display().to_string()));
        }

        let mut documents = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            for entry in self.fs.list_directory(&dir).await? {
                let hidden = entry
                    .file_name()
                    .map(|n| n.to_string_lossy().starts_with('.'))
                    .unwrap_or(true);
                if hidden {
                    continue;
                }

                if self.fs.is_directory(&entry).await? {
                    pending.push(entry);
                } else if let Some(path) = self.relative(&entry) {
                    let document = RemoteDocument::new(path);
                    if document.is_markdown() {
                        documents.push(document);
                    }
                }
            }
        }

        documents.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = documents.len(), root = %self.root.display(), "Listed local documents");
        Ok(documents)
    }

    async fn fetch_document(&self, path: &str) -> Result<String> {
        let target = resolve_under(&self.root, path)
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
        self.fs.read_to_string(&target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::TokioFileSystem;

    fn source(dir: &tempfile::TempDir) -> LocalDirectorySource {
        LocalDirectorySource::new(Arc::new(TokioFileSystem), dir.path())
    }

    #[tokio::test]
    async fn test_lists_markdown_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("music/jazz")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("music/jazz/song.md"), "x").unwrap();
        std::fs::write(dir.path().join("about.md"), "x").unwrap();
        std::fs::write(dir.path().join("cover.png"), "x").unwrap();
        std::fs::write(dir.path().join(".git/notes.md"), "x").unwrap();

        let paths: Vec<_> = source(&dir)
            .list_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.path)
            .collect();

        assert_eq!(paths, vec!["about.md", "music/jazz/song.md"]);
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "---\ntitle: A\n---\n").unwrap();

        let source = source(&dir);
        assert_eq!(
            source.fetch_document("a.md").await.unwrap(),
            "---\ntitle: A\n---\n"
        );
        assert!(source.fetch_document("../a.md").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalDirectorySource::new(Arc::new(TokioFileSystem), dir.path().join("nope"));

        assert!(matches!(
            source.list_documents().await,
            Err(BridgeError::NotFound(_))
        ));
    }
}
