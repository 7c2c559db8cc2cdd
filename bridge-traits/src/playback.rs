//! Media Element Abstraction
//!
//! The host-owned audio resource driven by the playback state machine. On the
//! web this is an `<audio>` element; on desktop it can wrap any native output.
//! Exactly one element is owned by one player session.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Point the element at a new source URL. Does not start playback.
    async fn set_source(&self, url: &str) -> Result<()>;

    /// Start or resume playback.
    ///
    /// # Errors
    ///
    /// Rejects when playback cannot start (autoplay restrictions, decode
    /// failure, unreachable source).
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the current position.
    async fn pause(&self) -> Result<()>;

    /// Move the playhead.
    async fn set_position(&self, position: Duration) -> Result<()>;

    /// Current playhead position.
    async fn position(&self) -> Result<Duration>;

    /// Duration of the loaded source, `None` until metadata is known.
    async fn duration(&self) -> Result<Option<Duration>>;

    /// Set output volume in `[0.0, 1.0]`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Release the underlying resource. The element must not be used after.
    async fn release(&self) -> Result<()>;
}
