// Command types - Control thread → audio thread

use crate::synth::click::ClickRequest;

#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Render a click at its scheduled audio-clock time
    Click(ClickRequest),
    /// Drop every click that has not started sounding yet
    CancelScheduled,
}
