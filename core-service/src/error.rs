use std::time::Duration;

use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Rate limit exceeded, retry after {}s", .retry_after.as_secs().max(1))]
    RateLimited { retry_after: Duration },

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

impl CoreError {
    /// Message safe to show to an end user. Internal failures collapse to a
    /// generic message; details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            CoreError::RateLimited { .. } => {
                "Too many requests, please try again later.".to_string()
            }
            CoreError::Library(LibraryError::InvalidInput { field, message }) => {
                format!("Invalid {}: {}", field, message)
            }
            CoreError::Library(LibraryError::NotFound { entity_type, id }) => {
                format!("No {} named '{}'", entity_type, id)
            }
            _ => "Internal server error".to_string(),
        }
    }

    /// Whether the caller should back off and retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::RateLimited { .. } => true,
            CoreError::Sync(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_hides_internals() {
        let error = CoreError::Library(LibraryError::Migration("disk I/O error".to_string()));

        assert_eq!(error.public_message(), "Internal server error");
        assert!(!error.public_message().contains("disk"));
    }

    #[test]
    fn test_public_message_for_client_errors() {
        let invalid = CoreError::Library(LibraryError::InvalidInput {
            field: "limit".to_string(),
            message: "must be at most 100".to_string(),
        });
        assert_eq!(invalid.public_message(), "Invalid limit: must be at most 100");

        let limited = CoreError::RateLimited {
            retry_after: Duration::from_millis(600),
        };
        assert_eq!(limited.to_string(), "Rate limit exceeded, retry after 1s");
        assert!(limited.is_retryable());
    }
}
