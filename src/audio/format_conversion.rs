// Sample format conversion for the cpal stream and WAV export
//
// Clicks are mixed in f32; the output device may want f32, i16 or u16 and the
// exporter writes 16-bit PCM. Nothing here allocates except `to_pcm16`.

use cpal::{FromSample, Sample};

/// f32 in [-1, 1] to signed 16-bit, clamped
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Whole buffer to 16-bit PCM (offline use only)
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| f32_to_i16(s)).collect()
}

/// Copy one mono sample into every channel of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}
