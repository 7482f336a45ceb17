// Timeline - Musical time representation
// Tempo and time signature as stored in the metronome settings

use std::fmt;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
///
/// The metronome stores and displays it, but the click cycle length is driven
/// by the selected subdivision pattern, not by the numerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 2, 3, 4, 5, 6, 7, 9, 12)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    pub const MAX_NUMERATOR: u32 = 32;
    pub const MAX_DENOMINATOR: u32 = 32;

    /// Creates a time signature, or `None` when the pair is out of range.
    /// Numerator must be 1..=32, denominator a power of two <= 32.
    pub fn try_new(numerator: u32, denominator: u32) -> Option<Self> {
        if numerator == 0 || numerator > Self::MAX_NUMERATOR {
            return None;
        }
        if !denominator.is_power_of_two() || denominator > Self::MAX_DENOMINATOR {
            return None;
        }
        Some(Self {
            numerator: numerator as u8,
            denominator: denominator as u8,
        })
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self {
            numerator: 3,
            denominator: 4,
        }
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self {
            numerator: 6,
            denominator: 8,
        }
    }

    /// Number of beats per bar
    pub fn beats_per_bar(&self) -> u32 {
        self.numerator as u32
    }

    /// Note value of one beat
    pub fn note_value(&self) -> u32 {
        self.denominator as u32
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo in BPM (Beats Per Minute)
/// Always an integer in [40, 400]; out-of-range input is clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    pub const MIN_BPM: u32 = 40;
    pub const MAX_BPM: u32 = 400;

    /// Creates a new tempo, clamping to [MIN_BPM, MAX_BPM]
    pub fn new(bpm: i64) -> Self {
        let clamped = bpm.clamp(Self::MIN_BPM as i64, Self::MAX_BPM as i64);
        Self { bpm: clamped as u32 }
    }

    /// Creates a tempo from a fractional BPM (rounded, then clamped)
    /// Returns `None` for NaN or infinite input.
    pub fn from_f64(bpm: f64) -> Option<Self> {
        if !bpm.is_finite() {
            return None;
        }
        let rounded = bpm.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64;
        Some(Self::new(rounded))
    }

    /// Whether a BPM value lies in the accepted range without clamping
    pub fn in_range(bpm: u32) -> bool {
        (Self::MIN_BPM..=Self::MAX_BPM).contains(&bpm)
    }

    /// Get BPM value
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}
