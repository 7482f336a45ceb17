// Pulse Metronome - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod error;
pub mod messaging;
pub mod preset;
pub mod runtime;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::clock::{Clock, ManualClock, SampleClock, SystemClock};
pub use audio::engine::AudioEngine;
pub use audio::output::{AudioOutput, CpalOutput, RecordingOutput};
pub use config::EngineConfig;
pub use error::{MetronomeError, Result};
pub use messaging::channels::{create_command_channel, create_notification_channel};
pub use messaging::notification::{Notification, NotificationKind};
pub use preset::PresetStore;
pub use sequencer::{
    Metronome, SchedulerTiming, Settings, SettingsRecord, Subdivision, Tempo, TimeSignature,
    TransportState, VisualSink, VisualState,
};
pub use synth::click::{ClickRequest, SoundType};
