// Subdivision patterns - How one beat is split into sub-beats
//
// Each pattern is an ordered list of relative duration multipliers. The first
// entry is always the main beat (multiplier 1). The list length is the number
// of clicks per pattern repeat and drives the scheduler's cycle length.

use std::fmt;
use std::str::FromStr;

const QUARTER: &[f64] = &[1.0];
const EIGHTH: &[f64] = &[1.0, 0.5];
const SIXTEENTH: &[f64] = &[1.0, 0.5, 0.5, 0.5];
const TRIPLET: &[f64] = &[1.0, 0.67, 0.67];
const TRIPLET_TWO_BEAT: &[f64] = &[1.0, 0.67, 0.67, 1.0, 0.67, 0.67];
const EIGHTH_TRIPLET: &[f64] = &[1.0, 0.33, 0.33, 0.5, 0.33, 0.33];
const SIXTEENTH_TRIPLET: &[f64] = &[
    1.0, 0.17, 0.17, 0.5, 0.17, 0.17, 0.5, 0.17, 0.17, 0.5, 0.17, 0.17,
];
const DOTTED_EIGHTH_SIXTEENTH: &[f64] = &[1.0, 0.75, 0.25];
const EIGHTH_TWO_SIXTEENTH: &[f64] = &[1.0, 0.5, 0.25, 0.25];
const TWO_SIXTEENTH_EIGHTH: &[f64] = &[1.0, 0.25, 0.25, 0.5];

/// Subdivision identifier (key into the pattern table)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum Subdivision {
    #[default]
    #[serde(rename = "quarter")]
    Quarter,
    #[serde(rename = "eighth")]
    Eighth,
    #[serde(rename = "sixteenth")]
    Sixteenth,
    #[serde(rename = "triplet")]
    Triplet,
    #[serde(rename = "triplet-2beat")]
    TripletTwoBeat,
    #[serde(rename = "eighth-triplet")]
    EighthTriplet,
    #[serde(rename = "sixteenth-triplet")]
    SixteenthTriplet,
    #[serde(rename = "dotted-eighth-sixteenth")]
    DottedEighthSixteenth,
    #[serde(rename = "eighth-two-sixteenth")]
    EighthTwoSixteenth,
    #[serde(rename = "two-sixteenth-eighth")]
    TwoSixteenthEighth,
}

impl Subdivision {
    pub const ALL: [Subdivision; 10] = [
        Subdivision::Quarter,
        Subdivision::Eighth,
        Subdivision::Sixteenth,
        Subdivision::Triplet,
        Subdivision::TripletTwoBeat,
        Subdivision::EighthTriplet,
        Subdivision::SixteenthTriplet,
        Subdivision::DottedEighthSixteenth,
        Subdivision::EighthTwoSixteenth,
        Subdivision::TwoSixteenthEighth,
    ];

    /// Stable identifier used in presets and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Subdivision::Quarter => "quarter",
            Subdivision::Eighth => "eighth",
            Subdivision::Sixteenth => "sixteenth",
            Subdivision::Triplet => "triplet",
            Subdivision::TripletTwoBeat => "triplet-2beat",
            Subdivision::EighthTriplet => "eighth-triplet",
            Subdivision::SixteenthTriplet => "sixteenth-triplet",
            Subdivision::DottedEighthSixteenth => "dotted-eighth-sixteenth",
            Subdivision::EighthTwoSixteenth => "eighth-two-sixteenth",
            Subdivision::TwoSixteenthEighth => "two-sixteenth-eighth",
        }
    }

    /// Look up a subdivision by identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Subdivision::Quarter => "Quarter note",
            Subdivision::Eighth => "Eighth note",
            Subdivision::Sixteenth => "Sixteenth note",
            Subdivision::Triplet => "Triplet",
            Subdivision::TripletTwoBeat => "Half-note triplet",
            Subdivision::EighthTriplet => "Eighth-note triplet",
            Subdivision::SixteenthTriplet => "Sixteenth-note triplet",
            Subdivision::DottedEighthSixteenth => "Dotted eighth + sixteenth",
            Subdivision::EighthTwoSixteenth => "Eighth + two sixteenths",
            Subdivision::TwoSixteenthEighth => "Two sixteenths + eighth",
        }
    }

    /// Relative duration multipliers, main beat first
    pub fn pattern(&self) -> &'static [f64] {
        match self {
            Subdivision::Quarter => QUARTER,
            Subdivision::Eighth => EIGHTH,
            Subdivision::Sixteenth => SIXTEENTH,
            Subdivision::Triplet => TRIPLET,
            Subdivision::TripletTwoBeat => TRIPLET_TWO_BEAT,
            Subdivision::EighthTriplet => EIGHTH_TRIPLET,
            Subdivision::SixteenthTriplet => SIXTEENTH_TRIPLET,
            Subdivision::DottedEighthSixteenth => DOTTED_EIGHTH_SIXTEENTH,
            Subdivision::EighthTwoSixteenth => EIGHTH_TWO_SIXTEENTH,
            Subdivision::TwoSixteenthEighth => TWO_SIXTEENTH_EIGHTH,
        }
    }

    /// Number of clicks per pattern repeat
    pub fn len(&self) -> usize {
        self.pattern().len()
    }

    /// Length of one pattern repeat, in beats
    pub fn cycle_beats(&self) -> f64 {
        self.pattern().iter().sum()
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown subdivision: {0}")]
pub struct UnknownSubdivision(pub String);

impl FromStr for Subdivision {
    type Err = UnknownSubdivision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownSubdivision(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pattern_starts_with_main_beat() {
        for subdivision in Subdivision::ALL {
            let pattern = subdivision.pattern();
            assert!(!pattern.is_empty(), "{} is empty", subdivision);
            assert_eq!(pattern[0], 1.0, "{} main beat", subdivision);
            assert!(
                pattern.iter().all(|&m| m > 0.0),
                "{} has a non-positive multiplier",
                subdivision
            );
        }
    }

    #[test]
    fn test_id_round_trip() {
        for subdivision in Subdivision::ALL {
            assert_eq!(Subdivision::from_id(subdivision.id()), Some(subdivision));
            assert_eq!(subdivision.id().parse::<Subdivision>(), Ok(subdivision));
        }
        assert!(Subdivision::from_id("quintuplet").is_none());
        assert!("".parse::<Subdivision>().is_err());
    }

    #[test]
    fn test_pattern_lengths() {
        assert_eq!(Subdivision::Quarter.len(), 1);
        assert_eq!(Subdivision::Eighth.len(), 2);
        assert_eq!(Subdivision::Triplet.len(), 3);
        assert_eq!(Subdivision::SixteenthTriplet.len(), 12);
        assert!((Subdivision::DottedEighthSixteenth.cycle_beats() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&Subdivision::TripletTwoBeat).unwrap();
        assert_eq!(json, "\"triplet-2beat\"");
        let back: Subdivision = serde_json::from_str("\"two-sixteenth-eighth\"").unwrap();
        assert_eq!(back, Subdivision::TwoSixteenthEighth);
    }
}
