// Synthesis module - weighted inverse summation
//
// Rebuilds a waveform from a coefficient array by treating each bin as the
// weight of its frequency:
//
//   x[n] = Re( Σ_k c[k] · e^(2πi·f_k·t_n) ) / (2π · num_freqs)
//
// This is not an orthonormal inverse DFT; it is the approximate dual of the
// forward quadrature. Runs on the calling thread.

use std::f64::consts::PI;
use std::ops::Range;

use rustfft::num_complex::Complex64;

use super::coefficients::CoefficientArray;
use super::progress::ProgressReporter;

/// Sequential reconstruction of samples from coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct InverseSynthesizer {
    progress_stride: usize,
    report_progress: bool,
    zoom: Option<(f64, f64)>,
}

impl Default for InverseSynthesizer {
    fn default() -> Self {
        Self {
            progress_stride: 4096,
            report_progress: false,
            zoom: None,
        }
    }
}

impl InverseSynthesizer {
    pub fn new(progress_stride: usize, report_progress: bool) -> Self {
        Self {
            progress_stride: progress_stride.max(1),
            report_progress,
            zoom: None,
        }
    }

    /// Only sum the bins whose frequency lies inside `[min_freq, max_freq]`
    pub fn with_zoom(mut self, min_freq: f64, max_freq: f64) -> Self {
        self.zoom = Some((min_freq, max_freq));
        self
    }

    fn bins(&self, coefficients: &CoefficientArray) -> Range<usize> {
        match self.zoom {
            Some((lo, hi)) => coefficients.sweep().bins_within(lo, hi),
            None => 0..coefficients.len(),
        }
    }

    /// Fill `target` with the reconstruction at `sample_rate`
    ///
    /// The normalization uses the full sweep length even when zoomed, so a
    /// zoomed reconstruction is the matching slice of the full one.
    pub fn synthesize_into(
        &self,
        coefficients: &CoefficientArray,
        target: &mut [f64],
        sample_rate: u32,
    ) {
        let sweep = coefficients.sweep();
        let bins = self.bins(coefficients);
        let scale = 2.0 * PI * coefficients.len() as f64;
        let rate = sample_rate as f64;

        let mut progress = self.report_progress.then(|| {
            ProgressReporter::stderr("synthesis", target.len(), self.progress_stride)
        });

        tracing::info!(
            "[InverseSynthesizer] Rebuilding {} samples from bins {:?}",
            target.len(),
            bins
        );

        for (n, sample) in target.iter_mut().enumerate() {
            let t = n as f64 / rate;
            let value: Complex64 = coefficients.values()[bins.clone()]
                .iter()
                .zip(bins.clone())
                .map(|(&c, k)| c * Complex64::new(0.0, 2.0 * PI * sweep.freq(k) * t).exp())
                .sum();
            *sample = value.re / scale;

            if let Some(progress) = progress.as_mut() {
                progress.tick(n);
            }
        }

        if let Some(progress) = progress.as_mut() {
            progress.finish();
        }
    }

    /// Allocate and fill a reconstruction of `num_samples` samples
    pub fn synthesize(
        &self,
        coefficients: &CoefficientArray,
        num_samples: usize,
        sample_rate: u32,
    ) -> Vec<f64> {
        let mut samples = vec![0.0; num_samples];
        self.synthesize_into(coefficients, &mut samples, sample_rate);
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sweep::FrequencySweep;
    use approx::assert_relative_eq;

    #[test]
    fn test_silence_reconstructs_to_silence() {
        let sweep = FrequencySweep::new(0.0, 10.0, 8).unwrap();
        let coefficients = CoefficientArray::from_values(sweep, vec![Complex64::new(0.0, 0.0); 8]);
        let samples = InverseSynthesizer::default().synthesize(&coefficients, 64, 32);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_single_bin_is_scaled_cosine() {
        let sweep = FrequencySweep::new(0.0, 4.0, 5).unwrap();
        let mut values = vec![Complex64::new(0.0, 0.0); 5];
        values[2] = Complex64::new(1.0, 0.0);
        let coefficients = CoefficientArray::from_values(sweep, values);

        let samples = InverseSynthesizer::default().synthesize(&coefficients, 16, 16);
        let scale = 2.0 * PI * 5.0;
        for (n, &sample) in samples.iter().enumerate() {
            let expected = (2.0 * PI * 2.0 * n as f64 / 16.0).cos() / scale;
            assert_relative_eq!(sample, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zoom_excludes_bins_outside_window() {
        let sweep = FrequencySweep::new(0.0, 4.0, 5).unwrap();
        let mut values = vec![Complex64::new(0.0, 0.0); 5];
        values[4] = Complex64::new(3.0, 0.0);
        let coefficients = CoefficientArray::from_values(sweep, values);

        let zoomed = InverseSynthesizer::default()
            .with_zoom(0.0, 2.5)
            .synthesize(&coefficients, 8, 8);
        assert!(zoomed.iter().all(|&s| s == 0.0));
    }
}
