// Transport - Running/stopped state and the practice timer deadline

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Running,
}

impl TransportState {
    pub fn is_running(&self) -> bool {
        matches!(self, TransportState::Running)
    }
}

/// State machine for start/stop and timer expiry.
///
/// The deadline is an absolute audio-clock time fixed at start; it survives
/// scheduler restarts caused by settings changes.
#[derive(Debug, Default)]
pub struct Transport {
    state: TransportState,
    deadline: Option<f64>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Audio-clock time at which the timer stops playback
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    /// Stopped -> Running. `timer_seconds` of 0 disables the timer.
    /// Returns false when already running.
    pub fn start(&mut self, audio_now: f64, timer_seconds: u64) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = TransportState::Running;
        self.deadline = (timer_seconds > 0).then(|| audio_now + timer_seconds as f64);
        true
    }

    /// Running -> Stopped. Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = TransportState::Stopped;
        self.deadline = None;
        true
    }

    pub fn is_expired(&self, audio_now: f64) -> bool {
        self.is_running() && self.deadline.is_some_and(|d| audio_now >= d)
    }

    /// Seconds left on the timer
    pub fn remaining(&self, audio_now: f64) -> Option<f64> {
        self.deadline.map(|d| (d - audio_now).max(0.0))
    }
}
