// Look-ahead scheduler - Commits clicks to the audio clock ahead of time
//
// A coarse timer calls `schedule_window` every few tens of milliseconds. Each
// call emits every note whose time falls before `now + lookahead` and advances
// the cursor; the audio backend renders each note at its exact time. Times
// accumulate from the start time by addition only, so coarse-timer jitter
// never reaches the click times.

use super::timeline::Tempo;

/// Smallest note duration multiplier; guards against zero or negative entries
pub const MIN_MULTIPLIER: f64 = 1e-3;

/// One note committed to the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    /// Audio-clock time in seconds
    pub time: f64,
    /// Index into the subdivision pattern (0 = downbeat)
    pub beat_index: usize,
}

/// Position of the next unscheduled note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub beat_index: usize,
    pub next_event_time: f64,
}

#[derive(Debug, Clone)]
pub struct LookAheadScheduler {
    cursor: Cursor,
    lookahead: f64,
}

impl LookAheadScheduler {
    /// Cursor at the downbeat, first note at `start_time`
    pub fn new(start_time: f64, lookahead_seconds: f64) -> Self {
        Self {
            cursor: Cursor {
                beat_index: 0,
                next_event_time: start_time,
            },
            lookahead: lookahead_seconds.max(0.0),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    /// Move the cursor past the current note
    pub fn advance(&mut self, tempo: Tempo, pattern: &[f64]) {
        if pattern.is_empty() {
            // No pattern: behave as one click per beat
            self.cursor.next_event_time += tempo.beat_duration_seconds();
            self.cursor.beat_index = 0;
            return;
        }
        let index = self.cursor.beat_index % pattern.len();
        let multiplier = pattern[index].max(MIN_MULTIPLIER);
        self.cursor.next_event_time += tempo.beat_duration_seconds() * multiplier;
        self.cursor.beat_index = (self.cursor.beat_index + 1) % pattern.len();
    }

    /// Emit every note due before `now + lookahead`, in time order.
    /// Returns the number of notes emitted.
    pub fn schedule_window(
        &mut self,
        now: f64,
        tempo: Tempo,
        pattern: &[f64],
        mut emit: impl FnMut(ScheduledNote),
    ) -> usize {
        let horizon = now + self.lookahead;
        let mut count = 0;
        while self.cursor.next_event_time < horizon {
            emit(ScheduledNote {
                time: self.cursor.next_event_time,
                beat_index: self.cursor.beat_index,
            });
            self.advance(tempo, pattern);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::subdivision::Subdivision;

    fn collect(
        scheduler: &mut LookAheadScheduler,
        now: f64,
        tempo: Tempo,
        pattern: &[f64],
    ) -> Vec<ScheduledNote> {
        let mut notes = Vec::new();
        scheduler.schedule_window(now, tempo, pattern, |n| notes.push(n));
        notes
    }

    #[test]
    fn test_window_contents_at_120_bpm() {
        let mut scheduler = LookAheadScheduler::new(0.0, 0.1);
        let tempo = Tempo::new(120);
        let pattern = Subdivision::Quarter.pattern();

        // First window holds only the note at t=0
        let notes = collect(&mut scheduler, 0.0, tempo, pattern);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].time, 0.0);

        // Nothing new until the next beat enters the window
        assert!(collect(&mut scheduler, 0.25, tempo, pattern).is_empty());
        let notes = collect(&mut scheduler, 0.45, tempo, pattern);
        assert_eq!(notes.len(), 1);
        assert!((notes[0].time - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_beat_index_cycles_for_every_pattern() {
        let tempo = Tempo::new(97);
        for subdivision in Subdivision::ALL {
            let pattern = subdivision.pattern();
            let mut scheduler = LookAheadScheduler::new(1.5, 0.1);

            // Three full cycles
            for step in 0..pattern.len() * 3 {
                assert_eq!(scheduler.cursor().beat_index, step % pattern.len());
                scheduler.advance(tempo, pattern);
            }

            let expected = 1.5 + 3.0 * subdivision.cycle_beats() * tempo.beat_duration_seconds();
            let actual = scheduler.cursor().next_event_time;
            assert!(
                (actual - expected).abs() < 1e-9,
                "{}: expected {} got {}",
                subdivision,
                expected,
                actual
            );
        }
    }

    #[test]
    fn test_notes_strictly_increasing() {
        let mut scheduler = LookAheadScheduler::new(0.0, 0.1);
        let tempo = Tempo::new(400);
        let pattern = Subdivision::SixteenthTriplet.pattern();

        let mut all = Vec::new();
        let mut now = 0.0;
        while now < 5.0 {
            all.extend(collect(&mut scheduler, now, tempo, pattern));
            now += 0.025;
        }
        assert!(all.len() > 100);
        for pair in all.windows(2) {
            assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn test_late_tick_catches_up() {
        // A tick that arrives a full second late still emits every note once
        let mut scheduler = LookAheadScheduler::new(0.0, 0.1);
        let tempo = Tempo::new(120);
        let pattern = Subdivision::Eighth.pattern();

        let notes = collect(&mut scheduler, 1.0, tempo, pattern);
        let times: Vec<f64> = notes.iter().map(|n| n.time).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        let indices: Vec<usize> = notes.iter().map(|n| n.beat_index).collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_degenerate_patterns_terminate() {
        let tempo = Tempo::new(400);

        let mut zero = LookAheadScheduler::new(0.0, 0.1);
        let count = zero.schedule_window(0.0, tempo, &[0.0, -1.0], |_| {});
        // 0.1 s window / (0.15 s * 1e-3) per note
        assert!(count > 0 && count < 1000);

        let mut empty = LookAheadScheduler::new(0.0, 0.1);
        assert_eq!(empty.schedule_window(0.0, tempo, &[], |_| {}), 1);
    }
}
