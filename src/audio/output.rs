// Audio output - The seam between the scheduler and whatever renders clicks

use std::sync::{Arc, Mutex, MutexGuard};

use ringbuf::traits::Producer;

use crate::audio::clock::{Clock, ManualClock};
use crate::audio::engine::{AudioEngine, AudioEngineError};
use crate::messaging::channels::{
    CommandProducer, SharedNotificationProducer, create_command_channel,
};
use crate::messaging::command::Command;
use crate::synth::click::ClickRequest;

/// Audio context as seen by the metronome core
pub trait AudioOutput {
    /// Create or resume the backend. Fails when the host has no audio output.
    fn resume(&mut self) -> Result<(), AudioEngineError>;

    /// Audio-clock time in seconds
    fn current_time(&self) -> f64;

    /// Render a click at `request.time` on the audio clock. Never blocks.
    fn render_sound(&mut self, request: ClickRequest);

    /// Drop clicks that are scheduled but not sounding yet
    fn cancel_scheduled(&mut self);
}

/// Real-time output over the cpal engine, created lazily on first `resume`
pub struct CpalOutput {
    engine: Option<AudioEngine>,
    command_tx: Option<CommandProducer>,
    notification_tx: SharedNotificationProducer,
    device_name: Option<String>,
    queue_capacity: usize,
    dropped: u64,
}

impl CpalOutput {
    pub fn new(
        notification_tx: SharedNotificationProducer,
        device_name: Option<String>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            engine: None,
            command_tx: None,
            notification_tx,
            device_name,
            queue_capacity: queue_capacity.max(1),
            dropped: 0,
        }
    }

    pub fn sample_rate(&self) -> Option<f32> {
        self.engine.as_ref().map(|e| e.sample_rate())
    }

    /// Clicks lost because the command queue was full
    pub fn dropped_clicks(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, cmd: Command) -> bool {
        match self.command_tx.as_mut() {
            Some(tx) => tx.try_push(cmd).is_ok(),
            None => false,
        }
    }
}

impl AudioOutput for CpalOutput {
    fn resume(&mut self) -> Result<(), AudioEngineError> {
        if self.engine.is_some() {
            return Ok(());
        }
        let (command_tx, command_rx) = create_command_channel(self.queue_capacity);
        let engine = AudioEngine::new(
            command_rx,
            self.notification_tx.clone(),
            self.device_name.as_deref(),
        )?;
        self.engine = Some(engine);
        self.command_tx = Some(command_tx);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.engine
            .as_ref()
            .map(|e| e.clock().seconds())
            .unwrap_or(0.0)
    }

    fn render_sound(&mut self, request: ClickRequest) {
        if !self.send(Command::Click(request)) {
            self.dropped += 1;
            tracing::warn!("Click queue full, dropped click at {:.3}s", request.time);
        }
    }

    fn cancel_scheduled(&mut self) {
        if self.command_tx.is_some() && !self.send(Command::CancelScheduled) {
            tracing::warn!("Click queue full, could not cancel scheduled clicks");
        }
    }
}

/// Output that records click requests against a virtual audio clock.
///
/// Used for offline rendering and to observe the scheduler without a sound
/// card. Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingOutput {
    clock: ManualClock,
    clicks: Arc<Mutex<Vec<ClickRequest>>>,
    cancels: Arc<Mutex<u32>>,
    unavailable: bool,
}

impl RecordingOutput {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    /// An output whose `resume` always fails, like a host without audio
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Clicks that were scheduled and not cancelled, in scheduling order
    pub fn clicks(&self) -> Vec<ClickRequest> {
        lock(&self.clicks).clone()
    }

    pub fn click_count(&self) -> usize {
        lock(&self.clicks).len()
    }

    pub fn cancel_count(&self) -> u32 {
        *lock(&self.cancels)
    }

    pub fn take_clicks(&self) -> Vec<ClickRequest> {
        std::mem::take(&mut *lock(&self.clicks))
    }
}

impl AudioOutput for RecordingOutput {
    fn resume(&mut self) -> Result<(), AudioEngineError> {
        if self.unavailable {
            return Err(AudioEngineError::NoOutputDevice);
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }

    fn render_sound(&mut self, request: ClickRequest) {
        lock(&self.clicks).push(request);
    }

    fn cancel_scheduled(&mut self) {
        let now = self.current_time();
        lock(&self.clicks).retain(|c| c.time <= now);
        *lock(&self.cancels) += 1;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::click::SoundType;
    use std::time::Duration;

    fn click(time: f64) -> ClickRequest {
        ClickRequest {
            sound: SoundType::Click,
            accent: false,
            volume: 0.8,
            time,
        }
    }

    #[test]
    fn test_recording_output_cancels_only_pending() {
        let clock = ManualClock::new();
        let mut output = RecordingOutput::new(clock.clone());
        let observer = output.clone();

        output.render_sound(click(0.0));
        output.render_sound(click(0.5));
        output.render_sound(click(1.0));

        clock.set(Duration::from_millis(500));
        output.cancel_scheduled();

        let times: Vec<f64> = observer.clicks().iter().map(|c| c.time).collect();
        assert_eq!(times, vec![0.0, 0.5]);
        assert_eq!(observer.cancel_count(), 1);
    }

    #[test]
    fn test_unavailable_output_fails_resume() {
        let mut output = RecordingOutput::unavailable();
        assert!(matches!(output.resume(), Err(AudioEngineError::NoOutputDevice)));
    }
}
