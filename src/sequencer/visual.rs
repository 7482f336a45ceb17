// Visual feedback state - What a front end shows for the beat indicator

/// `active` blinks on each main beat; `accent` marks the downbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualState {
    pub active: bool,
    pub accent: bool,
}

/// Receives visual state changes (fire-and-forget)
pub trait VisualSink {
    fn visual_changed(&mut self, state: VisualState);
}

/// Sink that ignores every change
#[derive(Debug, Default)]
pub struct NullVisualSink;

impl VisualSink for NullVisualSink {
    fn visual_changed(&mut self, _state: VisualState) {}
}

/// Sink that records every change; clones share the record
#[derive(Debug, Clone, Default)]
pub struct RecordingVisualSink {
    states: std::sync::Arc<std::sync::Mutex<Vec<VisualState>>>,
}

impl RecordingVisualSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<VisualState> {
        self.states
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl VisualSink for RecordingVisualSink {
    fn visual_changed(&mut self, state: VisualState) {
        if let Ok(mut states) = self.states.lock() {
            states.push(state);
        }
    }
}
