// Error types shared by the metronome core, presets and configuration

use crate::audio::engine::AudioEngineError;
use crate::audio::export::ExportError;
use crate::config::ConfigError;
use crate::preset::PresetError;

#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    /// The host has no usable audio output; playback cannot start
    #[error("Audio unavailable: {0}")]
    AudioUnavailable(#[from] AudioEngineError),

    #[error(
        "Invalid tempo ramp {start_bpm} -> {end_bpm} BPM over {minutes} min (BPM must be 40-400, duration 1-60 min)"
    )]
    InvalidRamp {
        start_bpm: u32,
        end_bpm: u32,
        minutes: u32,
    },

    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetronomeError>;
