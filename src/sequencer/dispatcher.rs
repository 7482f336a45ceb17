// Note dispatcher - Turns a scheduled note into a click and a visual pulse

use std::time::Duration;

use super::scheduler::ScheduledNote;
use super::settings::Settings;
use crate::synth::click::ClickRequest;

/// Deferred visual feedback for a main beat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualPulse {
    /// Wall-clock delay until the note sounds
    pub delay: Duration,
    pub accent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispatch {
    pub click: ClickRequest,
    /// Present only for sub-beat 0 of the pattern
    pub visual: Option<VisualPulse>,
}

/// Accent only on the downbeat of the pattern cycle, when enabled
#[inline]
pub fn is_accent(accent_enabled: bool, beat_index: usize) -> bool {
    accent_enabled && beat_index == 0
}

#[inline]
pub fn is_main_beat(beat_index: usize, pattern_len: usize) -> bool {
    pattern_len == 0 || beat_index % pattern_len == 0
}

pub fn dispatch_note(note: ScheduledNote, settings: &Settings, audio_now: f64) -> Dispatch {
    let accent = is_accent(settings.accent(), note.beat_index);

    let click = ClickRequest {
        sound: settings.sound(),
        accent,
        volume: settings.volume(),
        time: note.time,
    };

    let visual = is_main_beat(note.beat_index, settings.pattern().len()).then(|| {
        let delay = (note.time - audio_now).max(0.0);
        VisualPulse {
            delay: Duration::from_secs_f64(delay),
            accent,
        }
    });

    Dispatch { click, visual }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::subdivision::Subdivision;
    use crate::synth::click::SoundType;

    fn note(time: f64, beat_index: usize) -> ScheduledNote {
        ScheduledNote { time, beat_index }
    }

    #[test]
    fn test_accent_rule() {
        for enabled in [false, true] {
            for index in 0..12 {
                assert_eq!(is_accent(enabled, index), enabled && index == 0);
            }
        }
    }

    #[test]
    fn test_dispatch_main_beat() {
        let mut settings = Settings::default();
        settings.set_sound(SoundType::Hihat);
        settings.set_volume(0.5);

        let dispatch = dispatch_note(note(2.05, 0), &settings, 2.0);
        assert_eq!(dispatch.click.sound, SoundType::Hihat);
        assert!(dispatch.click.accent);
        assert_eq!(dispatch.click.volume, 0.5);
        assert_eq!(dispatch.click.time, 2.05);

        let visual = dispatch.visual.unwrap();
        assert!(visual.accent);
        assert!((visual.delay.as_secs_f64() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_sub_beats_have_no_visual() {
        let mut settings = Settings::default();
        settings.set_subdivision(Subdivision::Sixteenth);

        for index in 1..4 {
            let dispatch = dispatch_note(note(1.0, index), &settings, 0.9);
            assert!(!dispatch.click.accent);
            assert!(dispatch.visual.is_none());
        }
    }

    #[test]
    fn test_past_note_visual_fires_immediately() {
        let settings = Settings::default();
        let dispatch = dispatch_note(note(1.0, 0), &settings, 1.2);
        assert_eq!(dispatch.visual.unwrap().delay, Duration::ZERO);
    }

    #[test]
    fn test_accent_disabled() {
        let mut settings = Settings::default();
        settings.set_accent(false);
        let dispatch = dispatch_note(note(0.0, 0), &settings, 0.0);
        assert!(!dispatch.click.accent);
        assert_eq!(dispatch.visual.map(|v| v.accent), Some(false));
    }
}
