// Audio engine - Real-time cpal output rendering scheduled clicks
//
// # Format Support
//
// The device's preferred sample format is detected with `sample_format()` and
// the matching stream is built (F32, I16 or U16). Clicks are mixed in f32 and
// converted while writing the interleaved output buffer.
//
// # Timing
//
// The callback owns the audio clock: every rendered frame advances the
// `SampleClock`, so `clock.seconds()` is the time base clicks are scheduled
// against. A click for time `t` starts on sample `round(t * sample_rate)`.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::Consumer;

use crate::audio::clock::SampleClock;
use crate::audio::dsp_utils::{flush_denormals_to_zero, soft_clip};
use crate::audio::format_conversion::write_mono_to_interleaved_frame;
use crate::messaging::channels::{CommandConsumer, SharedNotificationProducer, try_notify};
use crate::messaging::command::Command;
use crate::messaging::notification::NotificationKind;
use crate::synth::voice::ClickMixer;

#[derive(Debug, thiserror::Error)]
pub enum AudioEngineError {
    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Output device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: f32,
    channels: usize,
    clock: SampleClock,
}

impl AudioEngine {
    /// Open the output device and start the stream.
    ///
    /// `device_name` selects an output by name; `None` uses the host default.
    pub fn new(
        command_rx: CommandConsumer,
        notification_tx: SharedNotificationProducer,
        device_name: Option<&str>,
    ) -> Result<Self, AudioEngineError> {
        let host = cpal::default_host();
        let device = select_output_device(&host, device_name)?;

        tracing::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioEngineError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        tracing::debug!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let clock = SampleClock::new(sample_rate);
        let mixer = ClickMixer::new(sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                command_rx,
                mixer,
                clock.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                command_rx,
                mixer,
                clock.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                command_rx,
                mixer,
                clock.clone(),
                notification_tx.clone(),
            ),
            other => return Err(AudioEngineError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream
            .play()
            .map_err(|e| AudioEngineError::Stream(e.to_string()))?;

        tracing::info!("Audio engine started: {} Hz, {} channels", sample_rate, channels);
        try_notify(&notification_tx, NotificationKind::AudioConnected);

        Ok(Self {
            _device: device,
            _stream: stream,
            sample_rate,
            channels,
            clock,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Audio clock advanced by the stream callback
    pub fn clock(&self) -> &SampleClock {
        &self.clock
    }

    /// Build an output stream for sample type `T`.
    ///
    /// The mixer and command consumer are moved into the callback; it is the
    /// only code touching them.
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut command_rx: CommandConsumer,
        mut mixer: ClickMixer,
        clock: SampleClock,
        notification_tx: SharedNotificationProducer,
    ) -> Result<Stream, AudioEngineError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let channels = channels.max(1);
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no blocking locks in here
                    let position = clock.current_sample();

                    while let Some(cmd) = command_rx.try_pop() {
                        match cmd {
                            Command::Click(request) => mixer.schedule(&request, position),
                            Command::CancelScheduled => mixer.cancel_pending(position),
                        }
                    }

                    let mut frames = 0usize;
                    for frame in data.chunks_mut(channels) {
                        let mut sample = mixer.next_sample(position + frames as u64);
                        sample = flush_denormals_to_zero(sample);
                        sample = soft_clip(sample);
                        write_mono_to_interleaved_frame(sample, frame);
                        frames += 1;
                    }

                    clock.advance(frames);
                },
                move |err| {
                    // Runs outside the real-time callback
                    tracing::error!("Audio stream error: {}", err);
                    try_notify(&notification_tx, NotificationKind::AudioStreamError);
                },
                None,
            )
            .map_err(|e| AudioEngineError::Stream(e.to_string()))
    }
}

fn select_output_device(
    host: &cpal::Host,
    device_name: Option<&str>,
) -> Result<Device, AudioEngineError> {
    match device_name {
        None => host
            .default_output_device()
            .ok_or(AudioEngineError::NoOutputDevice),
        Some(name) => {
            let devices = host
                .output_devices()
                .map_err(|e| AudioEngineError::Config(e.to_string()))?;
            for device in devices {
                if device.name().map(|n| n == name).unwrap_or(false) {
                    return Ok(device);
                }
            }
            Err(AudioEngineError::DeviceNotFound(name.to_string()))
        }
    }
}

/// Names of the host's output devices
pub fn list_output_devices() -> Vec<String> {
    let host = cpal::default_host();
    match host.output_devices() {
        Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
        Err(e) => {
            tracing::warn!("Cannot enumerate output devices: {}", e);
            Vec::new()
        }
    }
}
