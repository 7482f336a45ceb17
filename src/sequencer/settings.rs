// Settings - Tempo, meter, subdivision and sound options of one metronome
//
// Setters never fail: numbers are clamped, unknown identifiers are ignored.
// Each setter reports whether the stored value changed so the caller can
// decide to restart a running scheduler.

use super::subdivision::Subdivision;
use super::timeline::{Tempo, TimeSignature};
use crate::synth::click::SoundType;

/// Practice timer, `(0, 0)` means no timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerSetting {
    pub minutes: u32,
    pub seconds: u32,
}

impl TimerSetting {
    pub fn new(minutes: u32, seconds: u32) -> Self {
        Self { minutes, seconds }
    }

    pub fn total_seconds(&self) -> u64 {
        self.minutes as u64 * 60 + self.seconds as u64
    }

    pub fn is_enabled(&self) -> bool {
        self.total_seconds() > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    tempo: Tempo,
    time_signature: TimeSignature,
    subdivision: Subdivision,
    accent: bool,
    sound: SoundType,
    volume: f32,
    timer: TimerSetting,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tempo: Tempo::default(),
            time_signature: TimeSignature::default(),
            subdivision: Subdivision::default(),
            accent: true,
            sound: SoundType::default(),
            volume: 0.8,
            timer: TimerSetting::default(),
        }
    }
}

impl Settings {
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn subdivision(&self) -> Subdivision {
        self.subdivision
    }

    pub fn pattern(&self) -> &'static [f64] {
        self.subdivision.pattern()
    }

    pub fn accent(&self) -> bool {
        self.accent
    }

    pub fn sound(&self) -> SoundType {
        self.sound
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn timer(&self) -> TimerSetting {
        self.timer
    }

    /// Store `clamp(bpm, 40, 400)`
    pub fn set_tempo(&mut self, bpm: i64) -> bool {
        self.replace_tempo(Tempo::new(bpm))
    }

    pub fn replace_tempo(&mut self, tempo: Tempo) -> bool {
        replace(&mut self.tempo, tempo)
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) -> bool {
        replace(&mut self.subdivision, subdivision)
    }

    /// Select a subdivision by id. Unknown ids leave the setting untouched.
    pub fn set_subdivision_id(&mut self, id: &str) -> bool {
        match Subdivision::from_id(id) {
            Some(subdivision) => self.set_subdivision(subdivision),
            None => {
                tracing::warn!("Ignoring unknown subdivision '{}'", id);
                false
            }
        }
    }

    /// Rejected (no change) unless the pair is a valid time signature
    pub fn set_time_signature(&mut self, numerator: u32, denominator: u32) -> bool {
        match TimeSignature::try_new(numerator, denominator) {
            Some(ts) => replace(&mut self.time_signature, ts),
            None => {
                tracing::warn!(
                    "Ignoring invalid time signature {}/{}",
                    numerator,
                    denominator
                );
                false
            }
        }
    }

    pub fn set_accent(&mut self, enabled: bool) -> bool {
        replace(&mut self.accent, enabled)
    }

    pub fn set_sound(&mut self, sound: SoundType) -> bool {
        replace(&mut self.sound, sound)
    }

    pub fn set_sound_id(&mut self, id: &str) -> bool {
        match SoundType::from_id(id) {
            Some(sound) => self.set_sound(sound),
            None => {
                tracing::warn!("Ignoring unknown sound type '{}'", id);
                false
            }
        }
    }

    /// Store `clamp(volume, 0, 1)`; NaN is ignored
    pub fn set_volume(&mut self, volume: f32) -> bool {
        if volume.is_nan() {
            return false;
        }
        replace(&mut self.volume, volume.clamp(0.0, 1.0))
    }

    pub fn set_timer(&mut self, minutes: u32, seconds: u32) -> bool {
        replace(&mut self.timer, TimerSetting::new(minutes, seconds))
    }

    /// Snapshot as a flat persisted record
    pub fn to_record(&self) -> SettingsRecord {
        SettingsRecord {
            tempo: self.tempo.bpm() as f64,
            beats_per_measure: self.time_signature.beats_per_bar() as i64,
            note_value: self.time_signature.note_value() as i64,
            subdivision: self.subdivision.id().to_string(),
            accent: self.accent,
            sound_type: self.sound.id().to_string(),
            volume: self.volume as f64,
            timer_minutes: self.timer.minutes as i64,
            timer_seconds: self.timer.seconds as i64,
        }
    }

    /// Apply every field of a record through the setters.
    ///
    /// Returns true when a value the scheduler depends on (tempo,
    /// subdivision, time signature) changed.
    pub fn apply_record(&mut self, record: &SettingsRecord) -> bool {
        let mut timing_changed = false;

        match Tempo::from_f64(record.tempo) {
            Some(tempo) => timing_changed |= self.replace_tempo(tempo),
            None => tracing::warn!("Ignoring non-finite tempo in settings record"),
        }

        timing_changed |= self.set_subdivision_id(&record.subdivision);

        let numerator = to_u32(record.beats_per_measure);
        let denominator = to_u32(record.note_value);
        timing_changed |= self.set_time_signature(numerator, denominator);

        self.set_timer(to_u32(record.timer_minutes), to_u32(record.timer_seconds));

        if record.volume.is_finite() {
            self.set_volume(record.volume as f32);
        } else {
            tracing::warn!("Ignoring non-finite volume in settings record");
        }

        self.set_sound_id(&record.sound_type);
        self.set_accent(record.accent);

        timing_changed
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

// Negative counts become 0; huge ones saturate
fn to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// Flat settings record, the persisted form of `Settings`.
///
/// Types are deliberately loose (floats, signed integers, strings) so that a
/// hand-edited or foreign record still parses; `Settings::apply_record`
/// validates every field.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsRecord {
    pub tempo: f64,
    pub beats_per_measure: i64,
    pub note_value: i64,
    pub subdivision: String,
    pub accent: bool,
    pub sound_type: String,
    pub volume: f64,
    pub timer_minutes: i64,
    pub timer_seconds: i64,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Settings::default().to_record()
    }
}
