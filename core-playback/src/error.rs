//! # Playback Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The media element rejected the operation (autoplay policy, decode
    /// failure, unreachable source).
    #[error("Media element error: {0}")]
    Media(String),

    /// Attempted operation when no track is loaded.
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Index does not address a track in the playlist.
    #[error("Index {index} out of range for playlist of {len} tracks")]
    InvalidIndex { index: usize, len: usize },

    /// The session was torn down and its media element released.
    #[error("Player session has been released")]
    Released,
}

impl PlaybackError {
    /// Returns `true` if retrying (e.g. after a user gesture) may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::Media(_))
    }
}

impl From<BridgeError> for PlaybackError {
    fn from(error: BridgeError) -> Self {
        PlaybackError::Media(error.to_string())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
