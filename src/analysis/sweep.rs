// Sweep module - linear frequency grid for the transform
//
// The sweep visits `num_freqs` equally spaced frequencies between the two
// bounds, both bounds included.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Linear range of analysis frequencies in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencySweep {
    min_freq: f64,
    max_freq: f64,
    num_freqs: usize,
}

impl FrequencySweep {
    /// Create a sweep over `[min_freq, max_freq]` with `num_freqs` bins
    ///
    /// # Errors
    /// `ConfigError::InvalidSweep` when a bound is not finite, the bounds are
    /// reversed, or fewer than two bins are requested.
    pub fn new(min_freq: f64, max_freq: f64, num_freqs: usize) -> Result<Self, ConfigError> {
        if !min_freq.is_finite() || !max_freq.is_finite() {
            return Err(ConfigError::InvalidSweep {
                reason: format!("bounds must be finite (got {} to {})", min_freq, max_freq),
            });
        }
        if min_freq > max_freq {
            return Err(ConfigError::InvalidSweep {
                reason: format!("min_freq {} exceeds max_freq {}", min_freq, max_freq),
            });
        }
        if num_freqs < 2 {
            return Err(ConfigError::InvalidSweep {
                reason: format!("at least 2 frequency bins required (got {})", num_freqs),
            });
        }

        Ok(Self {
            min_freq,
            max_freq,
            num_freqs,
        })
    }

    pub fn min_freq(&self) -> f64 {
        self.min_freq
    }

    pub fn max_freq(&self) -> f64 {
        self.max_freq
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.num_freqs
    }

    /// Always false; a sweep holds at least two bins
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Frequency of bin `k` in Hz
    ///
    /// Interpolated as `(1 - v) * min + v * max` with `v = k / (num_freqs - 1)`
    /// so that the first and last bins land exactly on the bounds.
    pub fn freq(&self, k: usize) -> f64 {
        if self.min_freq == self.max_freq {
            return self.min_freq;
        }
        let v = k as f64 / (self.num_freqs - 1) as f64;
        (1.0 - v) * self.min_freq + v * self.max_freq
    }

    /// Spacing between adjacent bins in Hz
    pub fn bin_width(&self) -> f64 {
        (self.max_freq - self.min_freq) / (self.num_freqs - 1) as f64
    }

    /// Bin whose frequency is closest to `freq` (clamped to the sweep)
    pub fn nearest_bin(&self, freq: f64) -> usize {
        let width = self.bin_width();
        if width == 0.0 || !freq.is_finite() {
            return 0;
        }
        let position = ((freq - self.min_freq) / width).round();
        position.clamp(0.0, (self.num_freqs - 1) as f64) as usize
    }

    /// Bins whose frequency lies inside `[lo, hi]`
    ///
    /// Returns an empty range when the window misses the sweep entirely.
    pub fn bins_within(&self, lo: f64, hi: f64) -> Range<usize> {
        let first = (0..self.num_freqs).find(|&k| self.freq(k) >= lo);
        let Some(first) = first else {
            return 0..0;
        };
        let end = (first..self.num_freqs)
            .take_while(|&k| self.freq(k) <= hi)
            .last()
            .map(|last| last + 1)
            .unwrap_or(first);
        first..end
    }

    /// Iterate `(bin, frequency)` pairs in increasing bin order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.num_freqs).map(move |k| (k, self.freq(k)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_exact() {
        for &(lo, hi, n) in &[
            (0.0, 55.0, 1600),
            (0.1, 0.7, 3),
            (-20.0, 13.37, 17),
            (20.0, 20_000.0, 2),
        ] {
            let sweep = FrequencySweep::new(lo, hi, n).unwrap();
            assert_eq!(sweep.freq(0), lo);
            assert_eq!(sweep.freq(n - 1), hi);
        }
    }

    #[test]
    fn test_degenerate_sweep_repeats_frequency() {
        let sweep = FrequencySweep::new(0.1, 0.1, 9).unwrap();
        assert!(sweep.iter().all(|(_, f)| f == 0.1));
        assert_eq!(sweep.bin_width(), 0.0);
        assert_eq!(sweep.nearest_bin(5.0), 0);
    }

    #[test]
    fn test_rejects_single_bin_and_reversed_bounds() {
        assert!(FrequencySweep::new(0.0, 10.0, 1).is_err());
        assert!(FrequencySweep::new(0.0, 10.0, 0).is_err());
        assert!(FrequencySweep::new(10.0, 0.0, 8).is_err());
        assert!(FrequencySweep::new(f64::NAN, 1.0, 8).is_err());
    }

    #[test]
    fn test_nearest_bin() {
        let sweep = FrequencySweep::new(0.0, 100.0, 101).unwrap();
        assert_eq!(sweep.nearest_bin(50.0), 50);
        assert_eq!(sweep.nearest_bin(49.6), 50);
        assert_eq!(sweep.nearest_bin(-3.0), 0);
        assert_eq!(sweep.nearest_bin(1_000.0), 100);
    }

    #[test]
    fn test_bins_within_window() {
        let sweep = FrequencySweep::new(0.0, 100.0, 101).unwrap();
        assert_eq!(sweep.bins_within(10.0, 20.0), 10..21);
        assert_eq!(sweep.bins_within(-5.0, 500.0), 0..101);
        assert!(sweep.bins_within(200.0, 300.0).is_empty());
        assert!(sweep.bins_within(10.5, 10.7).is_empty());
    }
}
