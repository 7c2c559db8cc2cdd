//! Player state types and display helpers.

use core_library::playlist::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Repeat behavior at track boundaries.
///
/// Cycles `Off -> All -> One -> Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// `Idle` means the playlist is empty; the other two are the loaded sub-states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl PlayerStatus {
    pub fn is_loaded(self) -> bool {
        !matches!(self, PlayerStatus::Idle)
    }
}

/// Point-in-time view of a player session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub status: PlayerStatus,
    /// `None` while idle
    pub current_index: Option<usize>,
    pub current_track: Option<Track>,
    pub playlist_len: usize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f32,
}

/// Formats a playhead position as `m:ss`.
pub fn format_time(position: Duration) -> String {
    let total = position.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

/// Fraction of the track played, in `[0.0, 1.0]`; zero when the duration is
/// unknown or zero.
pub fn progress_fraction(position: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) if !d.is_zero() => (position.as_secs_f64() / d.as_secs_f64()).clamp(0.0, 1.0),
        _ => 0.0,
    }
}
