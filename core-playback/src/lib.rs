//! # Playback Module
//!
//! Client-side player session driving a single host media element.
//!
//! ## Overview
//!
//! This module handles:
//! - The playlist state machine (`Idle` / `Playing` / `Paused`)
//! - Shuffle and repeat modes and track-boundary transitions
//! - Queue mutations that never interrupt the playing track
//! - Progress polling published on the event bus

pub mod config;
pub mod error;
pub mod player;
pub mod progress;
pub mod state;

pub use config::PlayerConfig;
pub use error::{PlaybackError, Result};
pub use player::PlaybackStateMachine;
pub use state::{format_time, progress_fraction, PlaybackSnapshot, PlayerStatus, RepeatMode};
