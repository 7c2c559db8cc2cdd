//! # Content Library Module
//!
//! Owns the posts database and the read paths over it.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and connection pooling
//! - The post repository (upserts, tombstones, transactional rebuilds)
//! - Paginated, category-filtered post queries with lazily loaded bodies
//! - Playlist resolution from tags and radio stations

pub mod content;
pub mod db;
pub mod error;
pub mod models;
pub mod playlist;
pub mod query;
pub mod repositories;
mod schema;

pub use content::{split_front_matter, ContentMirror, FrontMatterBlock, CONTENT_PLACEHOLDER};
pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{Category, Document, Post};
pub use playlist::{PlaylistResolver, Track};
pub use query::{PostQueryService, PostsPage};
pub use repositories::{
    ChangeSummary, Page, PageRequest, PostChange, PostRepository, SqlitePostRepository,
};
