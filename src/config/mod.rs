//! Configuration for the recorder and player
//!
//! Settings are grouped per component and can be loaded from a TOML file.
//! Every field has a serde default, so partial files are fine:
//!
//! ```toml
//! [recorder]
//! exclude_paused_time = true
//!
//! [player]
//! default_speed = 1.5
//! loop_playback = false
//! ```

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Slowest allowed playback speed multiplier
pub const MIN_PLAYBACK_SPEED: f64 = 0.25;

/// Fastest allowed playback speed multiplier
pub const MAX_PLAYBACK_SPEED: f64 = 4.0;

/// Default interval between host ticks (roughly one display frame)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Default session language tag
pub const DEFAULT_LANGUAGE: &str = "en";

/// Combined configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub recorder: RecorderConfig,

    #[serde(default)]
    pub player: PlayerConfig,
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SessionError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SessionError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load configuration, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| SessionError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            SessionError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

/// Recorder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Subtract time spent paused from later event timestamps
    #[serde(default)]
    pub exclude_paused_time: bool,

    /// Language used when a session is started without one
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Maximum number of events per recording (0 = unlimited)
    #[serde(default)]
    pub max_events: usize,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            exclude_paused_time: false,
            default_language: default_language(),
            max_events: 0,
        }
    }
}

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Speed multiplier applied on construction
    #[serde(default = "default_speed")]
    pub default_speed: f64,

    /// Rewind and continue instead of ending
    #[serde(default)]
    pub loop_playback: bool,

    /// Interval hosts should wait between ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_speed() -> f64 {
    1.0
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_speed: default_speed(),
            loop_playback: false,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Clamp a speed multiplier into the supported range
pub fn clamp_speed(speed: f64) -> f64 {
    speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED)
}
