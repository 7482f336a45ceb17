// Engine configuration - RON file with timer intervals and device options

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sequencer::metronome::SchedulerTiming;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lookahead_ms: u64,
    pub tick_interval_ms: u64,
    pub visual_pulse_ms: u64,
    pub ramp_interval_ms: u64,
    pub tap_reset_ms: u64,
    /// Capacity of the click command queue to the audio thread
    pub click_queue_capacity: usize,
    pub notification_capacity: usize,
    /// Output device name; `None` uses the host default
    pub output_device: Option<String>,
    pub preset_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_ms: 100,
            tick_interval_ms: 25,
            visual_pulse_ms: 100,
            ramp_interval_ms: 1000,
            tap_reset_ms: 2000,
            click_queue_capacity: 256,
            notification_capacity: 64,
            output_device: None,
            preset_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: EngineConfig = ron::from_str(&data)?;
        Ok(config.sanitized())
    }

    /// Load `path`, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Unreadable config {}: {}. Using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Zero intervals and capacities replaced by their defaults
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let or_default = |value: u64, default: u64| if value == 0 { default } else { value };
        Self {
            lookahead_ms: or_default(self.lookahead_ms, defaults.lookahead_ms),
            tick_interval_ms: or_default(self.tick_interval_ms, defaults.tick_interval_ms),
            visual_pulse_ms: or_default(self.visual_pulse_ms, defaults.visual_pulse_ms),
            ramp_interval_ms: or_default(self.ramp_interval_ms, defaults.ramp_interval_ms),
            tap_reset_ms: or_default(self.tap_reset_ms, defaults.tap_reset_ms),
            click_queue_capacity: if self.click_queue_capacity == 0 {
                defaults.click_queue_capacity
            } else {
                self.click_queue_capacity
            },
            notification_capacity: if self.notification_capacity == 0 {
                defaults.notification_capacity
            } else {
                self.notification_capacity
            },
            ..self
        }
    }

    pub fn scheduler_timing(&self) -> SchedulerTiming {
        SchedulerTiming {
            lookahead: Duration::from_millis(self.lookahead_ms),
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            visual_pulse: Duration::from_millis(self.visual_pulse_ms),
            ramp_interval: Duration::from_millis(self.ramp_interval_ms),
            tap_reset: Duration::from_millis(self.tap_reset_ms),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pulse_metronome").join("config.ron"))
}
