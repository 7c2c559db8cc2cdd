//! # GitHub Provider
//!
//! Implements `DocumentSource` over the GitHub contents API.
//!
//! ## Overview
//!
//! This module provides:
//! - Recursive listing of markdown files under a repository directory
//! - Fetching and base64-decoding file contents, with a raw download
//!   fallback for files too large for the contents API
//! - Token authentication and status code mapping that keeps the
//!   retryable/fatal distinction intact

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GitHubDocumentSource;
pub use error::{GitHubError, Result};
