//! # Content Sync Module
//!
//! Reconciles the local content store with a remote document source.
//!
//! ## Overview
//!
//! This module manages a sync run end to end:
//! - Listing and fetching markdown documents via `DocumentSource`
//! - Parsing YAML front matter and applying defaults
//! - Upserting published documents and tombstoning unpublished ones
//! - Maintaining the local content mirror post bodies are read from
//!
//! ## Components
//!
//! - **Front matter** (`front_matter`): header/body split and lenient field extraction
//! - **Normalizer** (`normalizer`): defaults, date and audio path normalization
//! - **Mirror** (`mirror`): staged, swap-on-commit mirror of published files
//! - **Local source** (`local_source`): `DocumentSource` over a local directory
//! - **Sync Coordinator** (`coordinator`): orchestrates full and incremental runs

pub mod coordinator;
pub mod error;
pub mod front_matter;
pub mod local_source;
pub mod mirror;
pub mod normalizer;

pub use coordinator::{SkippedDocument, SyncConfig, SyncCoordinator, SyncMode, SyncReport};
pub use error::{Result, SyncError, ValidationWarning};
pub use front_matter::{parse_document, FrontMatter, ParsedDocument};
pub use local_source::LocalDirectorySource;
pub use mirror::MirrorWriter;
pub use normalizer::{normalize, normalize_audio_path, NormalizedDocument};
