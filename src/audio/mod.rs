// Audio module - Clocks, cpal backend and offline rendering

pub mod clock;
pub mod dsp_utils;
pub mod engine;
pub mod export;
pub mod format_conversion;
pub mod output;
