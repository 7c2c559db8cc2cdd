//! # Player Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume applied when the session starts, in `[0.0, 1.0]`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_volume")]
    pub initial_volume: f32,

    /// How often the progress poller samples the media element.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,

    /// Seed for the shuffle generator; `None` seeds from OS entropy.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_volume(),
            progress_interval: default_progress_interval(),
            shuffle_seed: None,
        }
    }
}

impl PlayerConfig {
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_progress_interval() -> Duration {
    Duration::from_millis(500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: PlayerConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.initial_volume, 1.0);
        assert_eq!(config.progress_interval, Duration::from_millis(500));
        assert!(config.shuffle_seed.is_none());
    }
}
