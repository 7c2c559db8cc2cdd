//! Error types for the GitHub provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// GitHub provider errors
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Token missing, expired or revoked
    #[error("GitHub authentication failed (status {status_code}): {message}")]
    Unauthorized { status_code: u16, message: String },

    /// API quota exhausted for this token or address
    #[error("GitHub rate limit exceeded")]
    RateLimited,

    /// Repository or path does not exist (or is not visible to the token)
    #[error("Not found on GitHub: {path}")]
    NotFound { path: String },

    /// Any other non-success status
    #[error("GitHub API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse GitHub response: {0}")]
    Parse(String),

    /// File content could not be decoded to UTF-8 text
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, GitHubError>;

impl GitHubError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GitHubError::RateLimited => true,
            GitHubError::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            GitHubError::Bridge(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<GitHubError> for BridgeError {
    fn from(error: GitHubError) -> Self {
        let retryable = error.is_retryable();
        match error {
            GitHubError::NotFound { path } => BridgeError::NotFound(path),
            GitHubError::Bridge(e) => e,
            e @ (GitHubError::Parse(_) | GitHubError::Decode { .. }) => {
                BridgeError::OperationFailed(e.to_string())
            }
            e => BridgeError::Network {
                message: e.to_string(),
                retryable,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GitHubError::Api {
            status_code: 502,
            message: "Bad Gateway".to_string(),
        };

        assert_eq!(error.to_string(), "GitHub API error (status 502): Bad Gateway");
    }

    #[test]
    fn test_auth_failure_is_not_retryable() {
        let error = GitHubError::Unauthorized {
            status_code: 401,
            message: "Bad credentials".to_string(),
        };
        let bridge_error: BridgeError = error.into();

        assert!(matches!(bridge_error, BridgeError::Network { .. }));
        assert!(!bridge_error.is_retryable());
    }

    #[test]
    fn test_transient_failures_stay_retryable() {
        let rate_limited: BridgeError = GitHubError::RateLimited.into();
        assert!(rate_limited.is_retryable());

        let server: BridgeError = GitHubError::Api {
            status_code: 503,
            message: String::new(),
        }
        .into();
        assert!(server.is_retryable());

        let client: BridgeError = GitHubError::Api {
            status_code: 422,
            message: String::new(),
        }
        .into();
        assert!(!client.is_retryable());
    }

    #[test]
    fn test_not_found_conversion() {
        let bridge_error: BridgeError = GitHubError::NotFound {
            path: "posts/a.md".to_string(),
        }
        .into();

        assert!(matches!(bridge_error, BridgeError::NotFound(p) if p == "posts/a.md"));
    }
}
