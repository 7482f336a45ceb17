// Click voices - Clicks pinned to absolute sample positions, mixed in the callback

use super::click::{ClickRequest, Timbre, click_length_samples, click_sample};

/// Maximum simultaneous click voices (scheduled or sounding)
pub const MAX_CLICK_VOICES: usize = 32;

#[derive(Debug, Clone, Copy)]
struct ClickVoice {
    timbre: Timbre,
    level: f32,
    start_sample: u64,
    end_sample: u64,
}

/// Mixes scheduled clicks at sample precision.
///
/// Voices live in a pre-allocated pool so nothing allocates on the audio
/// thread. When the pool is full the voice that started earliest is stolen.
pub struct ClickMixer {
    voices: Vec<ClickVoice>,
    sample_rate: f32,
    click_length: u64,
}

impl ClickMixer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_CLICK_VOICES),
            sample_rate,
            click_length: click_length_samples(sample_rate),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Sample index a click scheduled at `time` seconds starts on
    pub fn start_sample_for(&self, time: f64) -> u64 {
        if time <= 0.0 {
            return 0;
        }
        (time * self.sample_rate as f64).round() as u64
    }

    /// Queue a click. A click whose time already passed starts at `now_sample`.
    pub fn schedule(&mut self, request: &ClickRequest, now_sample: u64) {
        let start_sample = self.start_sample_for(request.time).max(now_sample);
        let voice = ClickVoice {
            timbre: request.timbre(),
            level: request.level(),
            start_sample,
            end_sample: start_sample + self.click_length,
        };

        if self.voices.len() < MAX_CLICK_VOICES {
            self.voices.push(voice);
            return;
        }

        // Steal the oldest voice
        let mut oldest = 0;
        for (i, v) in self.voices.iter().enumerate() {
            if v.start_sample < self.voices[oldest].start_sample {
                oldest = i;
            }
        }
        self.voices[oldest] = voice;
    }

    /// Drop clicks that have not started sounding at `now_sample`
    pub fn cancel_pending(&mut self, now_sample: u64) {
        self.voices.retain(|v| v.start_sample < now_sample);
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Mixed output at an absolute sample position. Finished voices are retired.
    pub fn next_sample(&mut self, position: u64) -> f32 {
        self.voices.retain(|v| v.end_sample > position);

        let mut output = 0.0;
        for voice in &self.voices {
            if position >= voice.start_sample {
                let t = (position - voice.start_sample) as f32 / self.sample_rate;
                output += click_sample(voice.timbre, t, voice.level);
            }
        }
        output
    }

    /// Voices scheduled or sounding
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn pending_count(&self, position: u64) -> usize {
        self.voices
            .iter()
            .filter(|v| v.start_sample > position)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::click::SoundType;

    const SAMPLE_RATE: f32 = 48000.0;

    fn request(time: f64) -> ClickRequest {
        ClickRequest {
            sound: SoundType::Click,
            accent: true,
            volume: 1.0,
            time,
        }
    }

    #[test]
    fn test_click_starts_at_exact_sample() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        mixer.schedule(&request(0.01), 0);

        // 0.01 s at 48 kHz = sample 480; silence before it
        for pos in 0..480 {
            assert_eq!(mixer.next_sample(pos), 0.0, "sound before onset at {}", pos);
        }
        // Onset sample is envelope 0, then the click sounds
        let mut energy = 0.0;
        for pos in 480..480 + 2400 {
            energy += mixer.next_sample(pos).abs();
        }
        assert!(energy > 1.0);
        assert_eq!(mixer.voice_count(), 0, "finished voice should be retired");
    }

    #[test]
    fn test_late_click_starts_immediately() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        mixer.schedule(&request(0.0), 1000);
        assert_eq!(mixer.pending_count(999), 1);
        assert_eq!(mixer.pending_count(1000), 0);
    }

    #[test]
    fn test_cancel_pending_keeps_sounding_voices() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        mixer.schedule(&request(0.0), 0);
        mixer.schedule(&request(0.5), 0);
        mixer.schedule(&request(1.0), 0);

        mixer.next_sample(10);
        mixer.cancel_pending(11);
        assert_eq!(mixer.voice_count(), 1);
        assert_eq!(mixer.pending_count(11), 0);
    }

    #[test]
    fn test_voice_stealing_when_full() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        for i in 0..MAX_CLICK_VOICES + 4 {
            mixer.schedule(&request(i as f64 * 0.1), 0);
        }
        assert_eq!(mixer.voice_count(), MAX_CLICK_VOICES);
        // The four earliest clicks were stolen
        assert_eq!(mixer.pending_count(0), MAX_CLICK_VOICES);
        assert_eq!(mixer.next_sample(0), 0.0);
    }

    #[test]
    fn test_overlapping_clicks_sum() {
        let mut single = ClickMixer::new(SAMPLE_RATE);
        let mut double = ClickMixer::new(SAMPLE_RATE);
        single.schedule(&request(0.0), 0);
        double.schedule(&request(0.0), 0);
        double.schedule(&request(0.0), 0);

        for pos in 0..500 {
            let a = single.next_sample(pos);
            let b = double.next_sample(pos);
            assert!((b - 2.0 * a).abs() < 1e-5);
        }
    }
}
