// Coefficients module - shared accumulator and its read-only result
//
// During the parallel phase the per-bin sums live in `SharedCoefficients`,
// a single mutex around the whole array. One lock for every bin keeps the
// reduction trivial to reason about; each acquisition covers one complex
// add, and there are `threads * num_freqs` of them per run. After the
// workers are joined the sums are frozen into a `CoefficientArray`.

use std::sync::Mutex;

use rustfft::num_complex::Complex64;
use serde::Serialize;

use super::sweep::FrequencySweep;
use crate::error::TransformError;

/// One of the three plotted views of a coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumChannel {
    Real,
    Imaginary,
    Magnitude,
}

impl SpectrumChannel {
    pub const ALL: [SpectrumChannel; 3] = [
        SpectrumChannel::Real,
        SpectrumChannel::Imaginary,
        SpectrumChannel::Magnitude,
    ];

    pub fn extract(&self, value: Complex64) -> f64 {
        match self {
            SpectrumChannel::Real => value.re,
            SpectrumChannel::Imaginary => value.im,
            SpectrumChannel::Magnitude => magnitude(value),
        }
    }
}

/// `sqrt(re² + im²)`
pub fn magnitude(value: Complex64) -> f64 {
    (value.re * value.re + value.im * value.im).sqrt()
}

/// Accumulator written by the transform workers
pub struct SharedCoefficients {
    sums: Mutex<Vec<Complex64>>,
}

impl SharedCoefficients {
    /// Zeroed accumulator with one slot per bin
    pub fn zeroed(len: usize) -> Result<Self, TransformError> {
        let mut sums = Vec::new();
        sums.try_reserve_exact(len)
            .map_err(|_| TransformError::AllocationFailed {
                what: "coefficient array".to_string(),
                requested: len,
            })?;
        sums.resize(len, Complex64::new(0.0, 0.0));
        Ok(Self {
            sums: Mutex::new(sums),
        })
    }

    /// Add one partial integral into bin `k` under the reduction lock
    pub fn add(&self, k: usize, partial: Complex64) -> Result<(), TransformError> {
        let mut sums = self.sums.lock().map_err(|_| TransformError::LockPoisoned {
            component: "coefficient array".to_string(),
        })?;
        sums[k] += partial;
        Ok(())
    }

    /// Freeze the sums once every worker has been joined
    pub fn into_array(self, sweep: FrequencySweep) -> Result<CoefficientArray, TransformError> {
        let values = self
            .sums
            .into_inner()
            .map_err(|_| TransformError::LockPoisoned {
                component: "coefficient array".to_string(),
            })?;
        Ok(CoefficientArray { sweep, values })
    }
}

/// Final per-bin spectral estimates
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientArray {
    sweep: FrequencySweep,
    values: Vec<Complex64>,
}

/// Strongest bin of a coefficient array
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectrumPeak {
    pub bin: usize,
    pub frequency_hz: f64,
    pub magnitude: f64,
}

impl CoefficientArray {
    /// Wrap precomputed values (one per sweep bin)
    ///
    /// # Panics
    /// Panics if `values.len()` differs from the sweep length.
    pub fn from_values(sweep: FrequencySweep, values: Vec<Complex64>) -> Self {
        assert_eq!(
            values.len(),
            sweep.len(),
            "coefficient count must match the sweep"
        );
        Self { sweep, values }
    }

    pub fn sweep(&self) -> &FrequencySweep {
        &self.sweep
    }

    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, k: usize) -> Option<Complex64> {
        self.values.get(k).copied()
    }

    /// Largest absolute value of `channel` over every bin
    pub fn channel_peak(&self, channel: SpectrumChannel) -> f64 {
        self.values
            .iter()
            .map(|&value| channel.extract(value).abs())
            .filter(|value| value.is_finite())
            .fold(0.0, f64::max)
    }

    /// Bin with the largest magnitude; `None` when every bin is zero
    pub fn peak(&self) -> Option<SpectrumPeak> {
        let (bin, magnitude) = self
            .values
            .iter()
            .map(|&value| magnitude(value))
            .enumerate()
            .filter(|(_, m)| m.is_finite())
            .fold(None, |best: Option<(usize, f64)>, (k, m)| match best {
                Some((_, best_m)) if best_m >= m => best,
                _ => Some((k, m)),
            })?;

        if magnitude == 0.0 {
            return None;
        }

        Some(SpectrumPeak {
            bin,
            frequency_hz: self.sweep.freq(bin),
            magnitude,
        })
    }
}
