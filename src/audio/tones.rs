// Tones module - deterministic test-tone synthesis
//
// The built-in input signal is the average of a handful of cosine tones,
// optionally mixed with seeded uniform white noise so runs stay reproducible.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::buffer::SampleBuffer;
use crate::error::StorageError;

/// One cosine component of the synthesized signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    pub frequency_hz: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Phase offset in radians
    #[serde(default)]
    pub phase: f64,
}

fn default_amplitude() -> f64 {
    1.0
}

impl ToneSpec {
    /// Unit-amplitude, zero-phase tone
    pub fn new(frequency_hz: f64) -> Self {
        Self {
            frequency_hz,
            amplitude: default_amplitude(),
            phase: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.frequency_hz.is_finite() && self.amplitude.is_finite() && self.phase.is_finite()
    }

    fn value_at(&self, t: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.frequency_hz * t + self.phase).cos()
    }
}

/// Averaged tone mix plus optional noise
#[derive(Debug, Clone, PartialEq)]
pub struct ToneMix {
    tones: Vec<ToneSpec>,
    noise_amplitude: f64,
    noise_seed: u64,
}

impl ToneMix {
    pub fn new(tones: Vec<ToneSpec>) -> Self {
        Self {
            tones,
            noise_amplitude: 0.0,
            noise_seed: 0,
        }
    }

    /// Mix uniform noise in `[-amplitude, amplitude)` drawn from a seeded RNG
    pub fn with_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise_amplitude = amplitude;
        self.noise_seed = seed;
        self
    }

    pub fn tones(&self) -> &[ToneSpec] {
        &self.tones
    }

    /// Fill `target` with the mix sampled at `sample_rate`
    pub fn fill(&self, target: &mut [f64], sample_rate: u32) {
        let rate = sample_rate as f64;
        let count = self.tones.len().max(1) as f64;
        let mut rng = StdRng::seed_from_u64(self.noise_seed);

        for (n, sample) in target.iter_mut().enumerate() {
            let t = n as f64 / rate;
            let mut value = self.tones.iter().map(|tone| tone.value_at(t)).sum::<f64>() / count;
            if self.noise_amplitude > 0.0 {
                value += rng.gen_range(-self.noise_amplitude..self.noise_amplitude);
            }
            *sample = value;
        }
    }

    /// Allocate a buffer of `duration_s` seconds and fill it
    pub fn synthesize(&self, sample_rate: u32, duration_s: f64) -> Result<SampleBuffer, StorageError> {
        let num_samples = (duration_s * sample_rate as f64).round() as usize;
        let mut buffer = SampleBuffer::zeroed(num_samples, sample_rate)?;
        self.fill(buffer.samples_mut()?, sample_rate);

        log::info!(
            "[ToneMix] Synthesized {} samples at {} Hz from {} tones (noise {})",
            num_samples,
            sample_rate,
            self.tones.len(),
            self.noise_amplitude
        );
        Ok(buffer)
    }
}
