// Metronome - Transport controller wiring settings, scheduler and outputs
//
// Everything runs on one thread. Coarse work (scheduler ticks, visual pulses,
// ramp steps) is queued as one-shot tasks on a `TimerQueue` keyed by the wall
// clock; the owner calls `poll()` whenever `next_due()` is reached. Clicks are
// handed to the `AudioOutput` with absolute audio-clock times.

use std::time::Duration;

use super::dispatcher::dispatch_note;
use super::ramp::{ActiveRamp, TempoRamp};
use super::scheduler::LookAheadScheduler;
use super::settings::{Settings, SettingsRecord};
use super::subdivision::Subdivision;
use super::tap_tempo::TapTempo;
use super::timeline::Tempo;
use super::transport::{Transport, TransportState};
use super::visual::{NullVisualSink, VisualSink, VisualState};
use crate::audio::clock::Clock;
use crate::audio::output::AudioOutput;
use crate::error::Result;
use crate::messaging::channels::{SharedNotificationProducer, try_notify};
use crate::messaging::notification::NotificationKind;
use crate::runtime::{TimerHandle, TimerQueue};
use crate::synth::click::SoundType;

/// Intervals of the coarse timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    /// How far ahead of the audio clock notes are committed
    pub lookahead: Duration,
    /// Period of the scheduler tick
    pub tick_interval: Duration,
    /// How long the beat indicator stays active
    pub visual_pulse: Duration,
    /// Period of the tempo ramp tick
    pub ramp_interval: Duration,
    /// Pause that restarts a tap-tempo sequence
    pub tap_reset: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(100),
            tick_interval: Duration::from_millis(25),
            visual_pulse: Duration::from_millis(100),
            ramp_interval: Duration::from_millis(1000),
            tap_reset: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    SchedulerTick,
    VisualPulse { accent: bool },
    VisualRelease,
    RampTick,
}

impl Task {
    fn is_visual(&self) -> bool {
        matches!(self, Task::VisualPulse { .. } | Task::VisualRelease)
    }
}

pub struct Metronome {
    settings: Settings,
    transport: Transport,
    scheduler: Option<LookAheadScheduler>,
    output: Box<dyn AudioOutput>,
    clock: Box<dyn Clock>,
    visual_sink: Box<dyn VisualSink>,
    visual: VisualState,
    notification_tx: SharedNotificationProducer,
    timers: TimerQueue<Task>,
    tick_handle: Option<TimerHandle>,
    ramp: Option<ActiveRamp>,
    ramp_handle: Option<TimerHandle>,
    tap: TapTempo,
    timing: SchedulerTiming,
}

impl Metronome {
    /// `clock` is the wall clock for coarse timers; the audio clock comes from
    /// `output`.
    pub fn new(
        output: Box<dyn AudioOutput>,
        clock: Box<dyn Clock>,
        notification_tx: SharedNotificationProducer,
    ) -> Self {
        let timing = SchedulerTiming::default();
        Self {
            settings: Settings::default(),
            transport: Transport::new(),
            scheduler: None,
            output,
            clock,
            visual_sink: Box::new(NullVisualSink),
            visual: VisualState::default(),
            notification_tx,
            timers: TimerQueue::new(),
            tick_handle: None,
            ramp: None,
            ramp_handle: None,
            tap: TapTempo::new(timing.tap_reset),
            timing,
        }
    }

    pub fn with_timing(mut self, timing: SchedulerTiming) -> Self {
        // A zero tick interval would re-run the tick forever within one poll
        let tick_interval = timing.tick_interval.max(Duration::from_millis(1));
        let ramp_interval = timing.ramp_interval.max(Duration::from_millis(1));
        self.timing = SchedulerTiming {
            tick_interval,
            ramp_interval,
            ..timing
        };
        self.tap = TapTempo::new(timing.tap_reset);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_visual_sink(mut self, sink: Box<dyn VisualSink>) -> Self {
        self.visual_sink = sink;
        self
    }

    // ---- State ----

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tempo(&self) -> Tempo {
        self.settings.tempo()
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_running()
    }

    pub fn visual_state(&self) -> VisualState {
        self.visual
    }

    pub fn timing(&self) -> SchedulerTiming {
        self.timing
    }

    /// Audio-clock time in seconds
    pub fn audio_time(&self) -> f64 {
        self.output.current_time()
    }

    /// Seconds left before the practice timer stops playback
    pub fn timer_remaining(&self) -> Option<f64> {
        self.transport.remaining(self.output.current_time())
    }

    pub fn active_ramp(&self) -> Option<&TempoRamp> {
        self.ramp.as_ref().map(|r| r.ramp())
    }

    // ---- Settings ----

    /// Snapshot of the current settings as a flat record
    pub fn get_settings(&self) -> SettingsRecord {
        self.settings.to_record()
    }

    /// Validate and apply a record field by field
    pub fn apply_settings(&mut self, record: &SettingsRecord) {
        if self.settings.apply_record(record) {
            self.restart_if_running();
        }
    }

    pub fn set_tempo(&mut self, bpm: i64) {
        if self.settings.set_tempo(bpm) {
            tracing::debug!("Tempo set to {}", self.settings.tempo());
            self.restart_if_running();
        }
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) {
        if self.settings.set_subdivision(subdivision) {
            tracing::debug!("Subdivision set to {}", subdivision);
            self.restart_if_running();
        }
    }

    /// Unknown ids are ignored. Returns whether the id was known.
    pub fn set_subdivision_id(&mut self, id: &str) -> bool {
        match Subdivision::from_id(id) {
            Some(subdivision) => {
                self.set_subdivision(subdivision);
                true
            }
            None => {
                tracing::warn!("Ignoring unknown subdivision '{}'", id);
                false
            }
        }
    }

    pub fn set_time_signature(&mut self, numerator: u32, denominator: u32) {
        if self.settings.set_time_signature(numerator, denominator) {
            tracing::debug!("Time signature set to {}", self.settings.time_signature());
            self.restart_if_running();
        }
    }

    /// Takes effect at the next start
    pub fn set_timer(&mut self, minutes: u32, seconds: u32) {
        self.settings.set_timer(minutes, seconds);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.settings.set_volume(volume);
    }

    pub fn set_sound(&mut self, sound: SoundType) {
        self.settings.set_sound(sound);
    }

    pub fn set_accent(&mut self, enabled: bool) {
        self.settings.set_accent(enabled);
    }

    // ---- Transport ----

    /// Stopped -> Running. No-op when already running.
    ///
    /// Fails with `AudioUnavailable` when the audio backend cannot be created.
    pub fn start(&mut self) -> Result<()> {
        if self.transport.is_running() {
            return Ok(());
        }
        self.output.resume()?;

        let audio_now = self.output.current_time();
        let timer = self.settings.timer();
        self.transport.start(audio_now, timer.total_seconds());
        self.begin_scheduling(audio_now);

        match self.transport.deadline() {
            Some(deadline) => tracing::info!(
                "Metronome started at {} (timer ends at {:.3}s)",
                self.settings.tempo(),
                deadline
            ),
            None => tracing::info!("Metronome started at {}", self.settings.tempo()),
        }
        Ok(())
    }

    /// Running -> Stopped. No-op when already stopped.
    pub fn stop(&mut self) {
        if self.transport.stop() {
            self.halt_scheduling();
            tracing::info!("Metronome stopped");
        }
    }

    pub fn toggle(&mut self) -> Result<TransportState> {
        if self.transport.is_running() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.transport.state())
    }

    /// Register a tap; applies and returns the tapped tempo once known
    pub fn tap_tempo(&mut self) -> Option<Tempo> {
        let tempo = self.tap.tap(self.clock.now())?;
        self.set_tempo(tempo.bpm() as i64);
        Some(tempo)
    }

    // ---- Progressive ramp ----

    /// Linearly move the tempo from `start_bpm` to `end_bpm` over `minutes`.
    ///
    /// Bounds are checked before anything changes. Replaces a ramp already in
    /// progress and starts the transport if needed.
    pub fn start_ramp(&mut self, start_bpm: u32, end_bpm: u32, minutes: u32) -> Result<()> {
        let ramp = TempoRamp::new(start_bpm, end_bpm, minutes)?;

        self.clear_ramp();
        self.set_tempo(start_bpm as i64);
        if !self.transport.is_running() {
            self.start()?;
        }

        let now = self.clock.now();
        self.ramp = Some(ActiveRamp::new(ramp, now));
        self.ramp_handle = Some(
            self.timers
                .schedule_at(now + self.timing.ramp_interval, Task::RampTick),
        );

        tracing::info!(
            "Tempo ramp {} -> {} BPM over {} min",
            start_bpm,
            end_bpm,
            minutes
        );
        self.notify(NotificationKind::RampStarted);
        Ok(())
    }

    /// Cancel the ramp in progress. Returns whether one was active.
    pub fn stop_ramp(&mut self) -> bool {
        if !self.clear_ramp() {
            return false;
        }
        tracing::info!("Tempo ramp cancelled");
        self.notify(NotificationKind::RampCancelled);
        true
    }

    // ---- Event loop ----

    /// Run every task due at the wall clock's current time.
    /// Returns the number of tasks run.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        while let Some((handle, task)) = self.timers.pop_due(now) {
            self.run_task(handle, task, now);
            ran += 1;
        }
        ran
    }

    /// Wall-clock time of the next pending task
    pub fn next_due(&mut self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// How long the driver may sleep before calling `poll` again
    pub fn time_until_next(&mut self) -> Option<Duration> {
        let now = self.clock.now();
        self.timers.next_due().map(|due| due.saturating_sub(now))
    }

    /// One scheduler pass against the audio clock
    pub fn tick(&mut self) {
        let audio_now = self.output.current_time();

        if self.transport.is_expired(audio_now) {
            self.transport.stop();
            self.halt_scheduling();
            tracing::info!("Practice timer expired at {:.3}s", audio_now);
            self.notify(NotificationKind::TimerExpired);
            return;
        }

        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };

        let wall_now = self.clock.now();
        let settings = &self.settings;
        let output = &mut self.output;
        let timers = &mut self.timers;

        scheduler.schedule_window(audio_now, settings.tempo(), settings.pattern(), |note| {
            let dispatch = dispatch_note(note, settings, audio_now);
            tracing::trace!(
                "Note {} at {:.4}s (accent: {})",
                note.beat_index,
                note.time,
                dispatch.click.accent
            );
            output.render_sound(dispatch.click);
            if let Some(pulse) = dispatch.visual {
                timers.schedule_at(
                    wall_now + pulse.delay,
                    Task::VisualPulse {
                        accent: pulse.accent,
                    },
                );
            }
        });

        self.tick_handle = Some(
            self.timers
                .schedule_at(wall_now + self.timing.tick_interval, Task::SchedulerTick),
        );
    }

    fn run_task(&mut self, handle: TimerHandle, task: Task, now: Duration) {
        match task {
            Task::SchedulerTick => {
                if self.tick_handle == Some(handle) {
                    self.tick_handle = None;
                    self.tick();
                }
            }
            Task::VisualPulse { accent } => {
                self.set_visual(VisualState {
                    active: true,
                    accent,
                });
                self.timers
                    .schedule_at(now + self.timing.visual_pulse, Task::VisualRelease);
            }
            Task::VisualRelease => {
                self.set_visual(VisualState {
                    active: false,
                    ..self.visual
                });
            }
            Task::RampTick => {
                if self.ramp_handle == Some(handle) {
                    self.ramp_handle = None;
                    self.ramp_tick(now);
                }
            }
        }
    }

    fn ramp_tick(&mut self, now: Duration) {
        let Some(active) = self.ramp else {
            return;
        };
        let step = active.step(now);
        self.set_tempo(step.bpm as i64);

        if step.done {
            self.ramp = None;
            tracing::info!("Tempo ramp completed at {} BPM", step.bpm);
            self.notify(NotificationKind::RampCompleted);
        } else {
            self.ramp_handle = Some(
                self.timers
                    .schedule_at(now + self.timing.ramp_interval, Task::RampTick),
            );
        }
    }

    /// Fresh cursor at the downbeat, first tick as soon as possible
    fn begin_scheduling(&mut self, audio_now: f64) {
        self.scheduler = Some(LookAheadScheduler::new(
            audio_now,
            self.timing.lookahead.as_secs_f64(),
        ));
        let now = self.clock.now();
        self.tick_handle = Some(self.timers.schedule_at(now, Task::SchedulerTick));
    }

    /// Drop the cursor, pending tick, uncommitted clicks and visual feedback
    fn halt_scheduling(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.timers.cancel(handle);
        }
        self.scheduler = None;
        self.output.cancel_scheduled();
        self.timers.retain(|task| !task.is_visual());
        self.set_visual(VisualState::default());
    }

    /// Settings that affect timing changed: discard the cursor and start over
    /// from the current audio time, keeping the timer deadline.
    fn restart_if_running(&mut self) {
        if !self.transport.is_running() {
            return;
        }
        tracing::debug!("Restarting scheduler at {}", self.settings.tempo());
        self.halt_scheduling();
        let audio_now = self.output.current_time();
        self.begin_scheduling(audio_now);
    }

    fn clear_ramp(&mut self) -> bool {
        if let Some(handle) = self.ramp_handle.take() {
            self.timers.cancel(handle);
        }
        self.ramp.take().is_some()
    }

    fn set_visual(&mut self, state: VisualState) {
        if self.visual != state {
            self.visual = state;
            self.visual_sink.visual_changed(state);
        }
    }

    fn notify(&self, kind: NotificationKind) {
        if !try_notify(&self.notification_tx, kind) {
            tracing::warn!("Notification queue full, dropped {}", kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clock::ManualClock;
    use crate::audio::output::RecordingOutput;
    use crate::messaging::channels::{NotificationConsumer, create_notification_channel};
    use ringbuf::traits::Consumer;
    use std::sync::{Arc, Mutex};

    fn metronome() -> (Metronome, ManualClock, RecordingOutput, NotificationConsumer) {
        let clock = ManualClock::new();
        let output = RecordingOutput::new(clock.clone());
        let (tx, rx) = create_notification_channel(16);
        let metronome = Metronome::new(
            Box::new(output.clone()),
            Box::new(clock.clone()),
            Arc::new(Mutex::new(tx)),
        );
        (metronome, clock, output, rx)
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut m, _clock, output, _rx) = metronome();
        m.start().unwrap();
        m.start().unwrap();
        assert!(m.is_running());

        m.poll();
        assert_eq!(output.click_count(), 1);
    }

    #[test]
    fn test_start_then_stop_schedules_nothing() {
        let (mut m, clock, output, _rx) = metronome();
        m.start().unwrap();
        m.stop();
        clock.advance(Duration::from_secs(1));
        m.poll();

        assert_eq!(output.click_count(), 0);
        assert_eq!(m.state(), TransportState::Stopped);
        assert!(m.next_due().is_none());
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let (mut m, _clock, output, _rx) = metronome();
        m.stop();
        assert_eq!(output.cancel_count(), 0);
    }

    #[test]
    fn test_unavailable_audio_fails_fast() {
        let clock = ManualClock::new();
        let (tx, _rx) = create_notification_channel(4);
        let mut m = Metronome::new(
            Box::new(RecordingOutput::unavailable()),
            Box::new(clock),
            Arc::new(Mutex::new(tx)),
        );
        assert!(matches!(
            m.start(),
            Err(crate::error::MetronomeError::AudioUnavailable(_))
        ));
        assert!(!m.is_running());
    }

    #[test]
    fn test_tempo_change_restarts_only_on_change() {
        let (mut m, _clock, output, _rx) = metronome();
        m.start().unwrap();
        m.poll();

        m.set_tempo(120);
        assert_eq!(output.cancel_count(), 0);

        m.set_tempo(90);
        assert_eq!(output.cancel_count(), 1);
        assert!(m.is_running());
    }

    #[test]
    fn test_invalid_ramp_changes_nothing() {
        let (mut m, _clock, _output, mut rx) = metronome();
        assert!(m.start_ramp(30, 120, 5).is_err());
        assert!(!m.is_running());
        assert_eq!(m.tempo().bpm(), 120);
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_stop_ramp_notifies_once() {
        let (mut m, _clock, _output, mut rx) = metronome();
        m.start_ramp(80, 100, 2).unwrap();
        assert!(m.is_running());
        assert_eq!(m.tempo().bpm(), 80);

        assert!(m.stop_ramp());
        assert!(!m.stop_ramp());

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_pop().map(|n| n.kind)).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::RampStarted, NotificationKind::RampCancelled]
        );
    }

    #[test]
    fn test_tap_tempo_sets_tempo() {
        let (mut m, clock, _output, _rx) = metronome();
        for _ in 0..4 {
            m.tap_tempo();
            clock.advance(Duration::from_millis(400));
        }
        assert_eq!(m.tempo().bpm(), 150);
    }
}
