use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A single document could not be read as front matter plus body.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// The document source could not be reached or refused access.
    #[error("Network error: {message}")]
    Network { message: String, retryable: bool },

    #[error("Store error: {0}")]
    Store(#[from] LibraryError),

    /// Writing or swapping the local content mirror failed.
    #[error("Mirror error at {path}: {message}")]
    Mirror { path: String, message: String },
}

impl SyncError {
    /// Whether running the sync again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network { retryable: true, .. })
    }

    pub(crate) fn parse(path: &str, message: impl Into<String>) -> Self {
        SyncError::Parse {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn mirror(path: impl fmt::Display, error: BridgeError) -> Self {
        SyncError::Mirror {
            path: path.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<BridgeError> for SyncError {
    /// Failures talking to the document source.
    fn from(error: BridgeError) -> Self {
        SyncError::Network {
            retryable: error.is_retryable(),
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// A missing or invalid field that was replaced with a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub field: String,
    pub message: String,
}

impl ValidationWarning {
    pub(crate) fn new(path: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.field, self.message)
    }
}
