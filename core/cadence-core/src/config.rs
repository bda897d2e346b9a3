//! Timer configuration loaded from `config.toml`.
//!
//! Every field has a default, so a missing file or a partial file both work.
//!
//! ```toml
//! snapshot_max_age_hours = 24
//! resume_running_window_secs = 300
//!
//! [ticker]
//! frame_interval_ms = 16
//! fallback_interval_ms = 1000
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{CadenceError, Result};

const DEFAULT_SNAPSHOT_MAX_AGE_HOURS: i64 = 24;
const DEFAULT_RESUME_RUNNING_WINDOW_SECS: i64 = 5 * 60;
const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
const DEFAULT_FALLBACK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TimerConfig {
    /// Snapshots not updated within this window are discarded on load.
    #[serde(default = "default_snapshot_max_age_hours")]
    pub snapshot_max_age_hours: i64,
    /// A running snapshot restored within this window keeps running;
    /// older ones come back paused with the away time counted as pause.
    #[serde(default = "default_resume_running_window_secs")]
    pub resume_running_window_secs: i64,
    #[serde(default)]
    pub ticker: TickerConfig,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            snapshot_max_age_hours: default_snapshot_max_age_hours(),
            resume_running_window_secs: default_resume_running_window_secs(),
            ticker: TickerConfig::default(),
        }
    }
}

impl TimerConfig {
    pub fn snapshot_max_age_ms(&self) -> i64 {
        self.snapshot_max_age_hours.saturating_mul(60 * 60 * 1000)
    }

    pub fn resume_running_window_ms(&self) -> i64 {
        self.resume_running_window_secs.saturating_mul(1000)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TickerConfig {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_fallback_interval_ms")]
    pub fallback_interval_ms: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            fallback_interval_ms: default_fallback_interval_ms(),
        }
    }
}

impl TickerConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn fallback_interval(&self) -> Duration {
        Duration::from_millis(self.fallback_interval_ms.max(1))
    }
}

fn default_snapshot_max_age_hours() -> i64 {
    DEFAULT_SNAPSHOT_MAX_AGE_HOURS
}

fn default_resume_running_window_secs() -> i64 {
    DEFAULT_RESUME_RUNNING_WINDOW_SECS
}

fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL_MS
}

fn default_fallback_interval_ms() -> u64 {
    DEFAULT_FALLBACK_INTERVAL_MS
}

/// Loads the timer configuration, returning defaults if the file doesn't exist.
pub fn load_timer_config(path: &Path) -> Result<TimerConfig> {
    if !path.exists() {
        return Ok(TimerConfig::default());
    }

    let content = fs_err::read_to_string(path)
        .map_err(|err| CadenceError::io(format!("reading {}", path.display()), err))?;
    toml::from_str::<TimerConfig>(&content).map_err(|err| CadenceError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}
