// Sound bank - Pregenerated click buffers
//
// An alternative to real-time click synthesis: every sound type is rendered
// once into a mono buffer. Noise components use a fixed seed so the bank is
// identical from one run to the next.

use super::click::SoundType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f32::consts::PI;

const NOISE_SEED: u64 = 0x6d65_7472_6f6e;

/// Pregenerated mono buffers for the 8 click variants
pub struct SoundBank {
    sample_rate: u32,
    buffers: HashMap<(SoundType, bool), Vec<f32>>,
}

impl SoundBank {
    pub fn generate(sample_rate: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(NOISE_SEED);
        let mut buffers = HashMap::with_capacity(8);
        for sound in SoundType::ALL {
            for accent in [false, true] {
                let data = generate_buffer(sound, accent, sample_rate as f32, &mut rng);
                buffers.insert((sound, accent), data);
            }
        }
        tracing::debug!("Generated sound bank at {} Hz", sample_rate);
        Self {
            sample_rate,
            buffers,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn get(&self, sound: SoundType, accent: bool) -> &[f32] {
        self.buffers
            .get(&(sound, accent))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (SoundType, bool, &[f32])> {
        SoundType::ALL.into_iter().flat_map(move |sound| {
            [false, true]
                .into_iter()
                .map(move |accent| (sound, accent, self.get(sound, accent)))
        })
    }
}

fn buffer_len(sample_rate: f32, duration: f32) -> usize {
    (sample_rate * duration) as usize
}

fn generate_buffer(sound: SoundType, accent: bool, sample_rate: f32, rng: &mut StdRng) -> Vec<f32> {
    match sound {
        SoundType::Click => click_buffer(accent, sample_rate),
        SoundType::Woodblock => woodblock_buffer(accent, sample_rate, rng),
        SoundType::Cowbell => cowbell_buffer(accent, sample_rate, rng),
        SoundType::Hihat => hihat_buffer(accent, sample_rate, rng),
    }
}

/// Sine with a linear fade over 50 ms
fn click_buffer(accent: bool, sample_rate: f32) -> Vec<f32> {
    let duration = 0.05;
    let frequency = if accent { 1000.0 } else { 800.0 };
    (0..buffer_len(sample_rate, duration))
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * PI * frequency * t).sin() * (1.0 - t / duration)
        })
        .collect()
}

/// Triangle plus a little positive noise, fast exponential decay
fn woodblock_buffer(accent: bool, sample_rate: f32, rng: &mut StdRng) -> Vec<f32> {
    let frequency = if accent { 900.0 } else { 700.0 };
    (0..buffer_len(sample_rate, 0.08))
        .map(|i| {
            let t = i as f32 / sample_rate;
            let x = t * frequency;
            let wave = 2.0 * (2.0 * (x - (x + 0.5).floor())).abs() - 1.0;
            let noise = rng.r#gen::<f32>() * 0.1;
            (wave * 0.9 + noise) * (-t * 30.0).exp()
        })
        .collect()
}

/// Two detuned squares (f, 1.5f) with noise and a wobbling metallic decay
fn cowbell_buffer(accent: bool, sample_rate: f32, rng: &mut StdRng) -> Vec<f32> {
    let f1 = if accent { 800.0 } else { 600.0 };
    let f2 = f1 * 1.5;
    (0..buffer_len(sample_rate, 0.1))
        .map(|i| {
            let t = i as f32 / sample_rate;
            let w1 = sign((2.0 * PI * f1 * t).sin());
            let w2 = sign((2.0 * PI * f2 * t).sin());
            let noise = rng.r#gen::<f32>() * 0.2 - 0.1;
            (w1 * 0.5 + w2 * 0.3 + noise) * 0.8 * (-t * 20.0).exp() * (1.0 + (t * 100.0).sin())
        })
        .collect()
}

/// First-difference filtered white noise; accents ring longer
fn hihat_buffer(accent: bool, sample_rate: f32, rng: &mut StdRng) -> Vec<f32> {
    let (duration, decay) = if accent { (0.1, 30.0) } else { (0.05, 50.0) };
    let len = buffer_len(sample_rate, duration);
    let mut data = Vec::with_capacity(len);
    let mut previous = 0.0;
    for i in 0..len {
        let t = i as f32 / sample_rate;
        let mut value = rng.r#gen::<f32>() * 2.0 - 1.0;
        if i > 0 {
            value -= previous * 0.3;
        }
        value *= (-t * decay).exp();
        data.push(value);
        previous = value;
    }
    data
}

// Math.sign semantics: zero stays zero
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
