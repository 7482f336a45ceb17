// Runtime - Cooperative single-threaded task scheduling

pub mod timers;

pub use timers::{TimerHandle, TimerQueue};
