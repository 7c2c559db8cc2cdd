//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for data access.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Pagination is supported via the `Page<T>` wrapper
//!
//! ## Available Repositories
//!
//! - `PostRepository` - Published documents keyed by file path

pub mod pagination;
pub mod post;

pub use pagination::{Page, PageRequest};
pub use post::{ChangeSummary, PostChange, PostRepository, SqlitePostRepository};
