//! # Content Mirror Writer
//!
//! Maintains the local copy of published documents that post bodies are
//! read from.
//!
//! A full sync builds the new mirror in a sibling staging directory. Only
//! after the store commit does the staging directory replace the live one;
//! a failed run discards it and the previous mirror stays in place.

use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_library::content::resolve_under;
use core_library::models::{format_timestamp, Document};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};

/// One file to write into the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFile {
    pub path: String,
    pub contents: String,
}

/// Header written back into mirrored files, with defaults applied.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MirrorHeader<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtitle: Option<&'a str>,
    category: &'a str,
    description: &'a str,
    tags: &'a [String],
    date_published: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    narration: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_file: Option<&'a str>,
    pinned: bool,
    hidden: bool,
    published: bool,
}

/// Render a normalized document back to front matter plus body.
pub fn render(document: &Document, body: &str) -> Result<String> {
    let header = MirrorHeader {
        title: &document.title,
        subtitle: document.subtitle.as_deref(),
        category: document.category.id(),
        description: &document.description,
        tags: &document.tags,
        date_published: format_timestamp(&document.date_published),
        narration: document.narration.as_deref(),
        audio_file: document.audio_file.as_deref(),
        pinned: document.pinned,
        hidden: document.hidden,
        published: true,
    };

    let yaml = serde_yaml::to_string(&header)
        .map_err(|e| SyncError::parse(&document.file_path, e.to_string()))?;

    Ok(format!("---\n{}---\n{}", yaml, body))
}

/// Mirror built in the staging directory, not yet live.
#[derive(Debug)]
#[must_use = "a staged mirror must be published or discarded"]
pub struct StagedMirror {
    dir: PathBuf,
    files: usize,
}

impl StagedMirror {
    pub fn files(&self) -> usize {
        self.files
    }
}

pub struct MirrorWriter {
    fs: Arc<dyn FileSystemAccess>,
    content_dir: PathBuf,
}

impl MirrorWriter {
    pub fn new(fs: Arc<dyn FileSystemAccess>, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            content_dir: content_dir.into(),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self
            .content_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "content".to_string());
        self.content_dir.with_file_name(format!("{}.{}", name, suffix))
    }

    /// Write every file into a fresh staging directory.
    pub async fn stage(&self, files: &[MirrorFile]) -> Result<StagedMirror> {
        let dir = self.sibling("staging");

        self.fs
            .delete_dir_all(&dir)
            .await
            .map_err(|e| SyncError::mirror(dir.display(), e))?;
        self.fs
            .create_dir_all(&dir)
            .await
            .map_err(|e| SyncError::mirror(dir.display(), e))?;

        let staged = StagedMirror {
            dir,
            files: files.len(),
        };

        for file in files {
            if let Err(e) = self.write_into(&staged.dir, file).await {
                self.discard(staged).await;
                return Err(e);
            }
        }

        debug!(files = staged.files, dir = %staged.dir.display(), "Mirror staged");
        Ok(staged)
    }

    /// Replace the live mirror with a staged one.
    pub async fn publish(&self, staged: StagedMirror) -> Result<()> {
        let backup = self.sibling("previous");
        let live = &self.content_dir;

        self.fs
            .delete_dir_all(&backup)
            .await
            .map_err(|e| SyncError::mirror(backup.display(), e))?;

        let had_live = self
            .fs
            .exists(live)
            .await
            .map_err(|e| SyncError::mirror(live.display(), e))?;
        if had_live {
            self.fs
                .rename(live, &backup)
                .await
                .map_err(|e| SyncError::mirror(live.display(), e))?;
        }

        if let Err(e) = self.fs.rename(&staged.dir, live).await {
            if had_live {
                if let Err(restore) = self.fs.rename(&backup, live).await {
                    warn!(error = %restore, "Could not restore previous mirror");
                }
            }
            return Err(SyncError::mirror(live.display(), e));
        }

        if let Err(e) = self.fs.delete_dir_all(&backup).await {
            warn!(error = %e, path = %backup.display(), "Could not remove previous mirror");
        }

        info!(files = staged.files, dir = %live.display(), "Content mirror replaced");
        Ok(())
    }

    /// Drop a staged mirror without touching the live one.
    pub async fn discard(&self, staged: StagedMirror) {
        if let Err(e) = self.fs.delete_dir_all(&staged.dir).await {
            warn!(error = %e, path = %staged.dir.display(), "Could not remove staged mirror");
        }
    }

    /// Update the live mirror in place: write `writes`, delete `removals`.
    ///
    /// Used after an incremental commit. Failures are returned per file and
    /// do not stop the remaining updates.
    pub async fn apply(&self, writes: &[MirrorFile], removals: &[String]) -> Vec<SyncError> {
        let mut errors = Vec::new();

        for file in writes {
            if let Err(e) = self.write_into(&self.content_dir, file).await {
                errors.push(e);
            }
        }

        for path in removals {
            let result = match resolve_under(&self.content_dir, path) {
                Ok(target) => self
                    .fs
                    .delete_file(&target)
                    .await
                    .map_err(|e| SyncError::mirror(path, e)),
                Err(e) => Err(SyncError::Mirror {
                    path: path.clone(),
                    message: e.to_string(),
                }),
            };
            if let Err(e) = result {
                errors.push(e);
            }
        }

        errors
    }

    async fn write_into(&self, root: &Path, file: &MirrorFile) -> Result<()> {
        let target = resolve_under(root, &file.path).map_err(|e| SyncError::Mirror {
            path: file.path.clone(),
            message: e.to_string(),
        })?;

        self.fs
            .write_file(&target, Bytes::from(file.contents.clone()))
            .await
            .map_err(|e| SyncError::mirror(&file.path, e))
    }
}
