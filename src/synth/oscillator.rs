// Oscillators - Stateless waveform evaluation for click timbres

use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveformType {
    Sine,
    Square,
    Saw,
    Triangle,
}

/// Value of a waveform at a normalized phase in [0, 1)
#[inline]
pub fn waveform_value(waveform: WaveformType, phase: f32) -> f32 {
    match waveform {
        WaveformType::Sine => (phase * 2.0 * PI).sin(),
        WaveformType::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        WaveformType::Saw => (phase * 2.0) - 1.0,
        WaveformType::Triangle => {
            if phase < 0.5 {
                (phase * 4.0) - 1.0
            } else {
                3.0 - (phase * 4.0)
            }
        }
    }
}

/// Value of a waveform at time `t` seconds for a given frequency.
/// Stateless: used by the real-time click renderer where voices start at
/// arbitrary sample positions.
#[inline]
pub fn waveform_at(waveform: WaveformType, frequency: f32, t: f32) -> f32 {
    let cycles = frequency * t;
    waveform_value(waveform, cycles - cycles.floor())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;
    const EPSILON: f32 = 0.001;

    const ALL: [WaveformType; 4] = [
        WaveformType::Sine,
        WaveformType::Square,
        WaveformType::Saw,
        WaveformType::Triangle,
    ];

    #[test]
    fn test_sine_starts_at_zero() {
        let first_sample = waveform_at(WaveformType::Sine, 1000.0, 0.0);
        assert!(first_sample.abs() < EPSILON, "First sample: {}", first_sample);
    }

    #[test]
    fn test_square_wave() {
        for i in 0..1000 {
            let sample = waveform_at(WaveformType::Square, 600.0, i as f32 / SAMPLE_RATE);
            assert!(
                (sample - 1.0).abs() < EPSILON || (sample + 1.0).abs() < EPSILON,
                "Square wave sample not ±1.0: {}",
                sample
            );
        }
    }

    #[test]
    fn test_all_waveforms_in_range() {
        for waveform in ALL {
            for i in 0..1000 {
                let sample = waveform_at(waveform, 1200.0, i as f32 / SAMPLE_RATE);
                assert!(
                    (-1.0..=1.0).contains(&sample),
                    "{:?} sample out of range: {}",
                    waveform,
                    sample
                );
            }
        }
    }

    #[test]
    fn test_waveform_key_points() {
        assert!((waveform_value(WaveformType::Sine, 0.25) - 1.0).abs() < EPSILON);
        assert_eq!(waveform_value(WaveformType::Saw, 0.0), -1.0);
        assert_eq!(waveform_value(WaveformType::Triangle, 0.0), -1.0);
        assert_eq!(waveform_value(WaveformType::Triangle, 0.5), 1.0);
        assert_eq!(waveform_value(WaveformType::Square, 0.75), -1.0);
    }

    #[test]
    fn test_waveform_at_is_periodic() {
        // One full period later the value repeats
        for waveform in ALL {
            let a = waveform_at(waveform, 800.0, 0.0003);
            let b = waveform_at(waveform, 800.0, 0.0003 + 1.0 / 800.0);
            assert!((a - b).abs() < 0.01, "{:?}: {} vs {}", waveform, a, b);
        }
    }
}
