// Audio export - Offline rendering to WAV files
//
// The click track is produced by a real `Metronome` driven on a virtual
// clock, so the exported file contains exactly what the scheduler and
// dispatcher would send to the sound card. Rendering runs as fast as possible.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hound::{WavSpec, WavWriter};

use crate::audio::clock::{Clock, ManualClock};
use crate::audio::dsp_utils::{flush_denormals_to_zero, limit_peak, soft_clip};
use crate::audio::format_conversion::{f32_to_i16, to_pcm16};
use crate::audio::output::RecordingOutput;
use crate::messaging::channels::create_notification_channel;
use crate::sequencer::metronome::{Metronome, SchedulerTiming};
use crate::sequencer::settings::Settings;
use crate::synth::buffers::SoundBank;
use crate::synth::click::ClickRequest;
use crate::synth::voice::ClickMixer;

/// Longest click track accepted, in seconds
pub const MAX_EXPORT_SECONDS: f64 = 3600.0;

const BLOCK_SIZE: u64 = 512;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Invalid duration: {0}s (must be > 0 and <= 3600)")]
    InvalidDuration(f64),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What an export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ClickTrackSummary {
    pub clicks: usize,
    pub samples: u64,
    pub sample_rate: u32,
}

fn mono_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Clicks the metronome schedules during the first `seconds` of playback
pub fn schedule_offline(settings: &Settings, seconds: f64, timing: SchedulerTiming) -> Vec<ClickRequest> {
    let clock = ManualClock::new();
    let output = RecordingOutput::new(clock.clone());
    let (tx, _rx) = create_notification_channel(8);

    let mut metronome = Metronome::new(
        Box::new(output.clone()),
        Box::new(clock.clone()),
        Arc::new(Mutex::new(tx)),
    )
    .with_timing(timing)
    .with_settings(*settings);

    if metronome.start().is_err() {
        return Vec::new();
    }

    let end = Duration::from_secs_f64(seconds);
    while clock.now() <= end {
        metronome.poll();
        if !metronome.is_running() {
            break;
        }
        match metronome.next_due() {
            Some(due) if due > clock.now() => clock.set(due),
            Some(_) => {}
            None => break,
        }
    }
    metronome.stop();

    let mut clicks: Vec<ClickRequest> = output
        .take_clicks()
        .into_iter()
        .filter(|c| c.time < seconds)
        .collect();
    clicks.sort_by(|a, b| a.time.total_cmp(&b.time));
    clicks
}

/// Render the click track for `settings` into a 16-bit mono WAV file
pub fn export_click_track(
    settings: &Settings,
    seconds: f64,
    sample_rate: u32,
    path: &Path,
) -> Result<ClickTrackSummary, ExportError> {
    if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_EXPORT_SECONDS {
        return Err(ExportError::InvalidDuration(seconds));
    }
    if sample_rate == 0 {
        return Err(ExportError::InvalidSampleRate(sample_rate));
    }

    let clicks = schedule_offline(settings, seconds, SchedulerTiming::default());
    let total_samples = (seconds * sample_rate as f64).round() as u64;

    tracing::info!(
        "Exporting click track: {:.2}s, {} clicks at {} Hz",
        seconds,
        clicks.len(),
        sample_rate
    );

    let mut writer = WavWriter::create(path, mono_spec(sample_rate))?;
    let mut mixer = ClickMixer::new(sample_rate as f32);
    let mut pending = clicks.iter().peekable();
    let mut position = 0u64;

    // Feed clicks block by block, the way the audio callback receives them
    while position < total_samples {
        let block_end = (position + BLOCK_SIZE).min(total_samples);
        while let Some(click) = pending.next_if(|c| mixer.start_sample_for(c.time) < block_end) {
            mixer.schedule(click, position);
        }
        for pos in position..block_end {
            let sample = soft_clip(flush_denormals_to_zero(mixer.next_sample(pos)));
            writer.write_sample(f32_to_i16(sample))?;
        }
        position = block_end;
    }

    writer.finalize()?;
    tracing::info!("Click track written to {}", path.display());

    Ok(ClickTrackSummary {
        clicks: clicks.len(),
        samples: total_samples,
        sample_rate,
    })
}

/// Write the 8 pregenerated buffers as `<sound>[_accent].wav` into `dir`
pub fn export_sound_bank(dir: &Path, sample_rate: u32) -> Result<Vec<PathBuf>, ExportError> {
    if sample_rate == 0 {
        return Err(ExportError::InvalidSampleRate(sample_rate));
    }
    fs::create_dir_all(dir)?;

    let bank = SoundBank::generate(sample_rate);
    let mut written = Vec::with_capacity(8);

    for (sound, accent, data) in bank.iter() {
        let name = if accent {
            format!("{}_accent.wav", sound.id())
        } else {
            format!("{}.wav", sound.id())
        };
        let path = dir.join(name);

        // Cowbell and woodblock buffers can exceed full scale
        let mut samples = data.to_vec();
        limit_peak(&mut samples, 0.99);

        let mut writer = WavWriter::create(&path, mono_spec(sample_rate))?;
        for s in to_pcm16(&samples) {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        written.push(path);
    }

    tracing::info!("Wrote {} sound files to {}", written.len(), dir.display());
    Ok(written)
}
