// Sequencer module - Tempo, subdivision patterns and look-ahead click scheduling

pub mod dispatcher;
pub mod metronome;
pub mod ramp;
pub mod scheduler;
pub mod settings;
pub mod subdivision;
pub mod tap_tempo;
pub mod timeline;
pub mod transport;
pub mod visual;

pub use dispatcher::{Dispatch, VisualPulse, dispatch_note, is_accent};
pub use metronome::{Metronome, SchedulerTiming};
pub use ramp::{ActiveRamp, RampStep, TempoRamp};
pub use scheduler::{Cursor, LookAheadScheduler, ScheduledNote};
pub use settings::{Settings, SettingsRecord, TimerSetting};
pub use subdivision::Subdivision;
pub use tap_tempo::TapTempo;
pub use timeline::{Tempo, TimeSignature};
pub use transport::{Transport, TransportState};
pub use visual::{NullVisualSink, RecordingVisualSink, VisualSink, VisualState};
