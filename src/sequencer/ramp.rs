// Progressive tempo ramp - Linear tempo change over a wall-clock duration

use std::time::Duration;

use super::timeline::Tempo;
use crate::error::{MetronomeError, Result};

pub const MIN_RAMP_MINUTES: u32 = 1;
pub const MAX_RAMP_MINUTES: u32 = 60;

/// Validated ramp parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoRamp {
    start_bpm: u32,
    end_bpm: u32,
    minutes: u32,
}

impl TempoRamp {
    /// Both BPM bounds must lie in 40-400 and the duration in 1-60 minutes
    pub fn new(start_bpm: u32, end_bpm: u32, minutes: u32) -> Result<Self> {
        let valid = Tempo::in_range(start_bpm)
            && Tempo::in_range(end_bpm)
            && (MIN_RAMP_MINUTES..=MAX_RAMP_MINUTES).contains(&minutes);
        if !valid {
            return Err(MetronomeError::InvalidRamp {
                start_bpm,
                end_bpm,
                minutes,
            });
        }
        Ok(Self {
            start_bpm,
            end_bpm,
            minutes,
        })
    }

    pub fn start_bpm(&self) -> u32 {
        self.start_bpm
    }

    pub fn end_bpm(&self) -> u32 {
        self.end_bpm
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn total(&self) -> Duration {
        Duration::from_secs(self.minutes as u64 * 60)
    }

    /// Fraction of the ramp covered after `elapsed`, clamped to [0, 1]
    pub fn progress(&self, elapsed: Duration) -> f64 {
        let total_ms = self.total().as_secs_f64() * 1000.0;
        (elapsed.as_secs_f64() * 1000.0 / total_ms).clamp(0.0, 1.0)
    }

    /// `round(start + (end - start) * progress)`
    pub fn bpm_at(&self, elapsed: Duration) -> u32 {
        let start = self.start_bpm as f64;
        let end = self.end_bpm as f64;
        (start + (end - start) * self.progress(elapsed)).round() as u32
    }
}

/// Result of one ramp tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampStep {
    pub bpm: u32,
    pub done: bool,
}

/// A ramp in progress, anchored at its wall-clock start
#[derive(Debug, Clone, Copy)]
pub struct ActiveRamp {
    ramp: TempoRamp,
    started_at: Duration,
}

impl ActiveRamp {
    pub fn new(ramp: TempoRamp, started_at: Duration) -> Self {
        Self { ramp, started_at }
    }

    pub fn ramp(&self) -> &TempoRamp {
        &self.ramp
    }

    pub fn step(&self, now: Duration) -> RampStep {
        let elapsed = now.saturating_sub(self.started_at);
        RampStep {
            bpm: self.ramp.bpm_at(elapsed),
            done: self.ramp.progress(elapsed) >= 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_validation() {
        assert!(TempoRamp::new(60, 120, 1).is_ok());
        assert!(TempoRamp::new(400, 40, 60).is_ok());
        assert!(matches!(
            TempoRamp::new(39, 120, 5),
            Err(MetronomeError::InvalidRamp { start_bpm: 39, .. })
        ));
        assert!(TempoRamp::new(60, 401, 5).is_err());
        assert!(TempoRamp::new(60, 120, 0).is_err());
        assert!(TempoRamp::new(60, 120, 61).is_err());
    }

    #[test]
    fn test_linear_interpolation() {
        let ramp = TempoRamp::new(60, 120, 1).unwrap();
        assert_eq!(ramp.bpm_at(Duration::ZERO), 60);
        assert_eq!(ramp.bpm_at(Duration::from_secs(30)), 90);
        assert_eq!(ramp.bpm_at(Duration::from_secs(60)), 120);
        assert_eq!(ramp.bpm_at(Duration::from_secs(600)), 120);
    }

    #[test]
    fn test_descending_ramp() {
        let ramp = TempoRamp::new(200, 100, 2).unwrap();
        assert_eq!(ramp.bpm_at(Duration::from_secs(60)), 150);
        assert_eq!(ramp.bpm_at(Duration::from_secs(90)), 125);
    }

    #[test]
    fn test_active_ramp_step() {
        let ramp = TempoRamp::new(60, 120, 1).unwrap();
        let active = ActiveRamp::new(ramp, Duration::from_secs(10));

        assert_eq!(
            active.step(Duration::from_secs(40)),
            RampStep { bpm: 90, done: false }
        );
        assert_eq!(
            active.step(Duration::from_secs(70)),
            RampStep { bpm: 120, done: true }
        );
        // Clock before the anchor counts as no progress
        assert_eq!(active.step(Duration::from_secs(5)).bpm, 60);
    }
}
