// Notifications - Named events emitted by the metronome core
//
// The core never renders user-facing text; a front end maps each kind to a
// message of its own.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// The practice timer ran out and stopped the transport
    TimerExpired,
    RampStarted,
    RampCompleted,
    RampCancelled,
    AudioConnected,
    AudioStreamError,
}

impl NotificationKind {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            NotificationKind::TimerExpired => "timerExpired",
            NotificationKind::RampStarted => "rampStarted",
            NotificationKind::RampCompleted => "rampCompleted",
            NotificationKind::RampCancelled => "rampCancelled",
            NotificationKind::AudioConnected => "audioConnected",
            NotificationKind::AudioStreamError => "audioStreamError",
        }
    }

    pub fn level(&self) -> NotificationLevel {
        match self {
            NotificationKind::AudioStreamError => NotificationLevel::Error,
            _ => NotificationLevel::Info,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub level: NotificationLevel,
    pub timestamp: u64, // Unix timestamp in milliseconds
}

impl Notification {
    pub fn new(kind: NotificationKind) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            kind,
            level: kind.level(),
            timestamp,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Whether the notification is younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        now.saturating_sub(self.timestamp) < max_age_ms
    }
}
