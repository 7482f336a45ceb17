// DSP hygiene - Helpers applied to the mixed click signal

/// Flush denormals to zero.
///
/// The exponential click tail produces very small values; below 1e-15 they
/// are forced to zero so the callback never runs on denormal arithmetic.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft saturation with tanh. Overlapping clicks can sum above 1.0.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Largest absolute sample value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Scale a buffer in place so its peak equals `target`, only when it exceeds it
pub fn limit_peak(samples: &mut [f32], target: f32) {
    let current = peak(samples);
    if current > target && current > 0.0 {
        let gain = target / current;
        for s in samples.iter_mut() {
            *s *= gain;
        }
    }
}
