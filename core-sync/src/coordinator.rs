//! # Sync Coordinator
//!
//! Reconciles the content store with a [`DocumentSource`].
//!
//! ## Workflow
//!
//! 1. List every markdown document in the source
//! 2. Fetch each one in turn (each request bounded by the request timeout)
//! 3. Parse front matter; a malformed file is skipped with a warning
//! 4. Published documents are normalized and staged as upserts, everything
//!    else is staged as a tombstone delete
//! 5. Commit in one transaction:
//!    - [`SyncMode::Full`] rebuilds the table from the staged upserts
//!    - [`SyncMode::Incremental`] applies upserts and tombstones in place
//! 6. Update the content mirror, then report duplicate paths
//!
//! Any network failure in steps 1-2 aborts the run before the store or the
//! mirror is touched.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncCoordinator, SyncConfig, SyncMode};
//!
//! let coordinator = SyncCoordinator::new(
//!     SyncConfig::default(),
//!     source,
//!     posts,
//!     file_system,
//!     "content",
//!     clock,
//!     event_bus,
//! );
//! let report = coordinator.run(SyncMode::Full).await?;
//! println!("{} documents processed", report.documents_processed);
//! ```

use crate::error::{Result, SyncError, ValidationWarning};
use crate::front_matter::parse_document;
use crate::mirror::{render, MirrorFile, MirrorWriter};
use crate::normalizer::normalize;
use bridge_traits::storage::{DocumentSource, FileSystemAccess};
use bridge_traits::time::Clock;
use core_library::models::Document;
use core_library::repositories::{PostChange, PostRepository};
use core_runtime::config::DEFAULT_REQUEST_TIMEOUT;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// How a run commits its staged changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Drop and rebuild the store from the source
    Full,
    /// Upsert and tombstone in place; rows absent from the source are kept
    Incremental,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Full => write!(f, "full"),
            SyncMode::Incremental => write!(f, "incremental"),
        }
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(SyncMode::Full),
            "incremental" => Ok(SyncMode::Incremental),
            other => Err(format!("Invalid sync mode: {}", other)),
        }
    }
}

/// Sync coordinator configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound for listing the source and for each document fetch
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A document left out of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub path: String,
    pub reason: String,
}

/// Outcome of a committed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: String,
    pub mode: SyncMode,
    pub source: String,
    /// Documents fetched from the source
    pub documents_processed: u64,
    /// Published documents written to the store
    pub documents_upserted: u64,
    /// Tombstones: unpublished documents (full mode) or rows actually
    /// removed (incremental mode)
    pub documents_removed: u64,
    pub skipped: Vec<SkippedDocument>,
    pub warnings: Vec<ValidationWarning>,
    /// Paths seen more than once, in the source listing or the store
    pub duplicate_paths: Vec<String>,
    /// Mirror files that could not be updated after an incremental commit
    pub mirror_errors: Vec<String>,
    pub duration_ms: u64,
}

/// Everything fetched and decided before the commit.
#[derive(Default)]
struct StagedRun {
    processed: u64,
    changes: Vec<PostChange>,
    files: Vec<MirrorFile>,
    skipped: Vec<SkippedDocument>,
    warnings: Vec<ValidationWarning>,
    listing_duplicates: Vec<String>,
}

impl StagedRun {
    fn upserts(&self) -> Vec<Document> {
        self.changes
            .iter()
            .filter_map(|change| match change {
                PostChange::Upsert(document) => Some(document.clone()),
                PostChange::Delete(_) => None,
            })
            .collect()
    }

    fn tombstones(&self) -> Vec<String> {
        self.changes
            .iter()
            .filter_map(|change| match change {
                PostChange::Delete(path) => Some(path.clone()),
                PostChange::Upsert(_) => None,
            })
            .collect()
    }
}

/// Sync coordinator for reconciling the store with its source
pub struct SyncCoordinator {
    config: SyncConfig,
    source: Arc<dyn DocumentSource>,
    posts: Arc<dyn PostRepository>,
    mirror: MirrorWriter,
    clock: Arc<dyn Clock>,
    event_bus: Arc<EventBus>,
}

impl SyncCoordinator {
    /// Create a new sync coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Sync configuration
    /// * `source` - Where documents are listed and fetched from
    /// * `posts` - The content store
    /// * `file_system` - Access to the local content mirror
    /// * `content_dir` - Root of the content mirror
    /// * `clock` - Time source for missing publication dates
    /// * `event_bus` - Receives started/skipped/completed/failed events
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn DocumentSource>,
        posts: Arc<dyn PostRepository>,
        file_system: Arc<dyn FileSystemAccess>,
        content_dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            source,
            posts,
            mirror: MirrorWriter::new(file_system, content_dir),
            clock,
            event_bus,
        }
    }

    /// Run one sync pass.
    ///
    /// # Errors
    ///
    /// - `SyncError::Network` when the source cannot be listed or a document
    ///   cannot be fetched; nothing has been written
    /// - `SyncError::Store` when the commit fails; the transaction was rolled
    ///   back
    /// - `SyncError::Mirror` when the full-sync mirror cannot be staged
    ///   (nothing written) or swapped in (store already committed)
    #[instrument(skip(self), fields(source = %self.source.name()))]
    pub async fn run(&self, mode: SyncMode) -> Result<SyncReport> {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let source = self.source.name();

        info!(run_id = %run_id, %mode, "Starting sync");
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Started {
                run_id: run_id.clone(),
                source: source.clone(),
                is_full_sync: mode == SyncMode::Full,
            }))
            .ok();

        match self.execute(&run_id, mode).await {
            Ok(mut report) => {
                report.source = source;
                report.duration_ms = started.elapsed().as_millis() as u64;

                info!(
                    run_id = %run_id,
                    processed = report.documents_processed,
                    upserted = report.documents_upserted,
                    removed = report.documents_removed,
                    skipped = report.skipped.len(),
                    duration_ms = report.duration_ms,
                    "Sync completed"
                );
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::Completed {
                        run_id,
                        documents_processed: report.documents_processed,
                        documents_upserted: report.documents_upserted,
                        documents_removed: report.documents_removed,
                        documents_skipped: report.skipped.len() as u64,
                        duration_ms: report.duration_ms,
                    }))
                    .ok();
                Ok(report)
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Sync failed");
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::Failed {
                        run_id,
                        message: e.to_string(),
                        recoverable: e.is_retryable(),
                    }))
                    .ok();
                Err(e)
            }
        }
    }

    async fn execute(&self, run_id: &str, mode: SyncMode) -> Result<SyncReport> {
        let staged = self.stage(run_id).await?;

        let mut mirror_errors = Vec::new();
        let (upserted, removed) = match mode {
            SyncMode::Full => {
                let documents = staged.upserts();
                let mirror = self.mirror.stage(&staged.files).await?;

                let written = match self.posts.replace_all(&documents).await {
                    Ok(written) => written,
                    Err(e) => {
                        self.mirror.discard(mirror).await;
                        return Err(e.into());
                    }
                };

                self.mirror.publish(mirror).await.map_err(|e| {
                    error!(error = %e, "Store committed but the content mirror was not replaced");
                    e
                })?;

                (written as u64, staged.tombstones().len() as u64)
            }
            SyncMode::Incremental => {
                let summary = self.posts.apply_changes(&staged.changes).await?;

                for e in self.mirror.apply(&staged.files, &staged.tombstones()).await {
                    warn!(error = %e, "Content mirror update failed");
                    mirror_errors.push(e.to_string());
                }

                (summary.upserted as u64, summary.deleted as u64)
            }
        };

        let duplicate_paths = self.check_duplicates(run_id, &staged.listing_duplicates).await;

        Ok(SyncReport {
            run_id: run_id.to_string(),
            mode,
            source: String::new(),
            documents_processed: staged.processed,
            documents_upserted: upserted,
            documents_removed: removed,
            skipped: staged.skipped,
            warnings: staged.warnings,
            duplicate_paths,
            mirror_errors,
            duration_ms: 0,
        })
    }

    /// Fetch, parse and normalize every document without writing anything.
    async fn stage(&self, run_id: &str) -> Result<StagedRun> {
        let listing = self
            .bounded("list documents", self.source.list_documents())
            .await?;

        let mut staged = StagedRun::default();
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();

        for remote in listing.into_iter().filter(|d| d.is_markdown()) {
            *seen.entry(remote.path.clone()).or_default() += 1;

            let raw = self
                .bounded(&remote.path, self.source.fetch_document(&remote.path))
                .await?;
            staged.processed += 1;

            let parsed = match parse_document(&remote.path, &raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    self.skip(run_id, &mut staged, &remote.path, e);
                    continue;
                }
            };

            if !parsed.front_matter.published {
                debug!(path = %remote.path, "Unpublished document, staging tombstone");
                staged.changes.push(PostChange::Delete(remote.path));
                continue;
            }

            let normalized = normalize(&remote.path, &parsed.front_matter, self.clock.as_ref());
            let contents = match render(&normalized.document, &parsed.body) {
                Ok(contents) => contents,
                Err(e) => {
                    self.skip(run_id, &mut staged, &remote.path, e);
                    continue;
                }
            };

            staged.warnings.extend(normalized.warnings);
            staged.files.push(MirrorFile {
                path: remote.path,
                contents,
            });
            staged.changes.push(PostChange::Upsert(normalized.document));
        }

        staged.listing_duplicates = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(path, _)| path)
            .collect();

        Ok(staged)
    }

    fn skip(&self, run_id: &str, staged: &mut StagedRun, path: &str, error: SyncError) {
        warn!(path, error = %error, "Skipping malformed document");
        let reason = match error {
            SyncError::Parse { message, .. } => message,
            other => other.to_string(),
        };

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::DocumentSkipped {
                run_id: run_id.to_string(),
                path: path.to_string(),
                reason: reason.clone(),
            }))
            .ok();

        staged.skipped.push(SkippedDocument {
            path: path.to_string(),
            reason,
        });
    }

    /// Report duplicate paths after commit. Never fails the run.
    async fn check_duplicates(&self, run_id: &str, listing_duplicates: &[String]) -> Vec<String> {
        let mut paths: Vec<String> = listing_duplicates.to_vec();

        match self.posts.find_duplicate_paths().await {
            Ok(rows) => paths.extend(rows.into_iter().map(|(path, _)| path)),
            Err(e) => warn!(error = %e, "Duplicate path check failed"),
        }

        paths.sort();
        paths.dedup();

        if !paths.is_empty() {
            warn!(paths = ?paths, "Duplicate file paths found");
            self.event_bus
                .emit(CoreEvent::Sync(SyncEvent::DuplicatePaths {
                    run_id: run_id.to_string(),
                    paths: paths.clone(),
                }))
                .ok();
        }

        paths
    }

    /// Apply the request timeout to one source call.
    async fn bounded<T, F>(&self, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = bridge_traits::error::Result<T>>,
    {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result.map_err(SyncError::from),
            Err(_) => Err(SyncError::Network {
                message: format!(
                    "{} timed out after {:?}",
                    what, self.config.request_timeout
                ),
                retryable: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_parse_and_display() {
        assert_eq!("full".parse::<SyncMode>().unwrap(), SyncMode::Full);
        assert_eq!(" Incremental ".parse::<SyncMode>().unwrap(), SyncMode::Incremental);
        assert!("partial".parse::<SyncMode>().is_err());
        assert_eq!(SyncMode::Incremental.to_string(), "incremental");
    }

    #[test]
    fn test_default_config_uses_request_timeout() {
        assert_eq!(SyncConfig::default().request_timeout, Duration::from_secs(30));
    }
}
