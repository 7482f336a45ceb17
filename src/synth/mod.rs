// Synth module - Click timbres, oscillators and sound generation

pub mod buffers;
pub mod click;
pub mod oscillator;
pub mod voice;
