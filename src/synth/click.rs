// Click synthesis - Timbre table and the pure click sample function

use crate::synth::oscillator::{WaveformType, waveform_at};
use std::fmt;
use std::str::FromStr;

/// Attack time of the click envelope (seconds)
pub const CLICK_ATTACK: f32 = 0.005;
/// Total click length (seconds)
pub const CLICK_DURATION: f32 = 0.05;
/// Envelope floor reached at CLICK_DURATION, relative to the click level
pub const CLICK_FLOOR: f32 = 0.001;
/// Gain applied to non-accented clicks
pub const REGULAR_GAIN: f32 = 0.7;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    #[default]
    Click,
    Woodblock,
    Cowbell,
    Hihat,
}

impl SoundType {
    pub const ALL: [SoundType; 4] = [
        SoundType::Click,
        SoundType::Woodblock,
        SoundType::Cowbell,
        SoundType::Hihat,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SoundType::Click => "click",
            SoundType::Woodblock => "woodblock",
            SoundType::Cowbell => "cowbell",
            SoundType::Hihat => "hihat",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sound type: {0}")]
pub struct UnknownSoundType(pub String);

impl FromStr for SoundType {
    type Err = UnknownSoundType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownSoundType(s.to_string()))
    }
}

/// Oscillator shape and pitch of one click variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timbre {
    pub waveform: WaveformType,
    pub frequency: f32,
}

/// Fixed lookup: 4 sound types x accent/regular
pub fn timbre(sound: SoundType, accent: bool) -> Timbre {
    let (waveform, accent_hz, regular_hz) = match sound {
        SoundType::Click => (WaveformType::Sine, 1000.0, 800.0),
        SoundType::Woodblock => (WaveformType::Triangle, 900.0, 700.0),
        SoundType::Cowbell => (WaveformType::Square, 800.0, 600.0),
        SoundType::Hihat => (WaveformType::Saw, 1200.0, 1000.0),
    };
    Timbre {
        waveform,
        frequency: if accent { accent_hz } else { regular_hz },
    }
}

/// One click to be rendered at an absolute audio-clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickRequest {
    pub sound: SoundType,
    pub accent: bool,
    pub volume: f32,
    /// Audio-clock time in seconds
    pub time: f64,
}

impl ClickRequest {
    pub fn timbre(&self) -> Timbre {
        timbre(self.sound, self.accent)
    }

    pub fn level(&self) -> f32 {
        click_level(self.volume, self.accent)
    }
}

/// Peak level of a click: full volume on accents, 70% otherwise
#[inline]
pub fn click_level(volume: f32, accent: bool) -> f32 {
    let volume = volume.clamp(0.0, 1.0);
    if accent { volume } else { volume * REGULAR_GAIN }
}

/// Envelope gain at `t` seconds after the click onset, peak normalized to 1
#[inline]
pub fn click_envelope(t: f32) -> f32 {
    if !(0.0..CLICK_DURATION).contains(&t) {
        return 0.0;
    }
    if t < CLICK_ATTACK {
        return t / CLICK_ATTACK;
    }
    // Exponential segment from 1.0 at the end of the attack to CLICK_FLOOR
    let progress = (t - CLICK_ATTACK) / (CLICK_DURATION - CLICK_ATTACK);
    CLICK_FLOOR.powf(progress)
}

/// Sample value of a click `t` seconds after its onset
#[inline]
pub fn click_sample(timbre: Timbre, t: f32, level: f32) -> f32 {
    let env = click_envelope(t);
    if env == 0.0 {
        return 0.0;
    }
    waveform_at(timbre.waveform, timbre.frequency, t) * env * level
}

/// Click length in samples at a given rate
pub fn click_length_samples(sample_rate: f32) -> u64 {
    (CLICK_DURATION * sample_rate).round() as u64
}
