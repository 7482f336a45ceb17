// Tap tempo - BPM from the spacing of user taps

use std::collections::VecDeque;
use std::time::Duration;

use super::timeline::Tempo;

/// Taps kept for the average
pub const MAX_TAPS: usize = 5;
pub const DEFAULT_RESET_GAP: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct TapTempo {
    taps: VecDeque<Duration>,
    reset_gap: Duration,
}

impl TapTempo {
    pub fn new(reset_gap: Duration) -> Self {
        Self {
            taps: VecDeque::with_capacity(MAX_TAPS + 1),
            reset_gap,
        }
    }

    /// Register a tap at wall-clock `now`.
    ///
    /// A gap of `reset_gap` or more starts a new sequence. Returns the tempo
    /// once at least two taps are known.
    pub fn tap(&mut self, now: Duration) -> Option<Tempo> {
        if let Some(&last) = self.taps.back()
            && now.saturating_sub(last) >= self.reset_gap
        {
            self.taps.clear();
        }

        self.taps.push_back(now);
        if self.taps.len() > MAX_TAPS {
            self.taps.pop_front();
        }

        self.tempo()
    }

    /// Tempo from the mean interval of the stored taps
    pub fn tempo(&self) -> Option<Tempo> {
        let (first, last) = (self.taps.front()?, self.taps.back()?);
        let intervals = self.taps.len().checked_sub(1).filter(|&n| n > 0)?;
        let mean_ms = last.saturating_sub(*first).as_secs_f64() * 1000.0 / intervals as f64;
        if mean_ms <= 0.0 {
            return Some(Tempo::new(Tempo::MAX_BPM as i64));
        }
        Tempo::from_f64(60_000.0 / mean_ms)
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_GAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_constant_500ms_taps_give_120() {
        let mut tap = TapTempo::default();
        assert!(tap.tap(ms(1000)).is_none());
        for i in 1..8 {
            let tempo = tap.tap(ms(1000 + i * 500)).unwrap();
            assert_eq!(tempo.bpm(), 120);
        }
        assert_eq!(tap.tap_count(), MAX_TAPS);
    }

    #[test]
    fn test_long_gap_restarts_sequence() {
        let mut tap = TapTempo::default();
        tap.tap(ms(0));
        tap.tap(ms(1000));
        assert_eq!(tap.tempo().map(|t| t.bpm()), Some(60));

        assert!(tap.tap(ms(3000)).is_none());
        assert_eq!(tap.tap_count(), 1);
        assert_eq!(tap.tap(ms(3400)).map(|t| t.bpm()), Some(150));
    }

    #[test]
    fn test_mean_uses_last_five_taps() {
        let mut tap = TapTempo::default();
        // Slow taps pushed out by four fast ones
        for t in [0, 1000, 2000, 2250, 2500, 2750, 3000] {
            tap.tap(ms(t));
        }
        assert_eq!(tap.tempo().map(|t| t.bpm()), Some(240));
    }

    #[test]
    fn test_result_is_clamped() {
        let mut tap = TapTempo::default();
        tap.tap(ms(0));
        assert_eq!(tap.tap(ms(50)).map(|t| t.bpm()), Some(400));

        tap.reset();
        tap.tap(ms(0));
        assert_eq!(tap.tap(ms(1900)).map(|t| t.bpm()), Some(40));
    }
}
