use super::*;
use crate::config::TransformConfig;
use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

fn transform(
    samples: &[f64],
    sample_rate: u32,
    sweep: FrequencySweep,
    threads: usize,
    quadrature: QuadratureKind,
    depth: Option<usize>,
) -> CoefficientArray {
    let config = TransformConfig {
        threads,
        quadrature,
        depth,
        report_progress: false,
        ..TransformConfig::default()
    };
    TransformEngine::new(sweep, &config)
        .unwrap()
        .run(Signal::new(samples, sample_rate))
        .unwrap()
        .coefficients
}

fn cosine(freq: f64, sample_rate: u32, num_samples: usize) -> Vec<f64> {
    (0..num_samples)
        .map(|n| (2.0 * PI * freq * n as f64 / sample_rate as f64).cos())
        .collect()
}

/// Candidate frequency with the largest correlation against `samples`
fn dominant_frequency(samples: &[f64], sample_rate: u32, sweep: &FrequencySweep) -> f64 {
    sweep
        .iter()
        .map(|(_, f)| {
            let correlation: Complex64 = samples
                .iter()
                .enumerate()
                .map(|(n, &x)| {
                    Complex64::new(0.0, -2.0 * PI * f * n as f64 / sample_rate as f64).exp() * x
                })
                .sum();
            (f, correlation.norm())
        })
        .fold((0.0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best })
        .0
}

fn max_divergence(a: &CoefficientArray, b: &CoefficientArray) -> f64 {
    a.values()
        .iter()
        .zip(b.values())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

#[test]
fn test_thread_count_does_not_change_result() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let samples: Vec<f64> = (0..997).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let sweep = FrequencySweep::new(0.0, 50.0, 64).unwrap();

    for kind in [QuadratureKind::PointSum, QuadratureKind::Trapezoidal] {
        let reference = transform(&samples, 1000, sweep, 1, kind, None);
        let scale = reference.channel_peak(SpectrumChannel::Magnitude);
        assert!(scale > 0.0);

        for threads in [2, 3, 4, 7, 16, 1000] {
            let other = transform(&samples, 1000, sweep, threads, kind, None);
            let divergence = max_divergence(&reference, &other);
            assert!(
                divergence <= 1e-9 * scale,
                "{:?} threads={} diverged by {:e}",
                kind,
                threads,
                divergence
            );
        }
    }
}

#[test]
fn test_trapezoid_of_constant_ignores_thread_count() {
    // 1000 samples at 1 kHz span t(0)..t(999): 0.999 s.
    let samples = vec![1.0; 1000];
    let sweep = FrequencySweep::new(0.0, 0.0, 2).unwrap();
    for threads in [1, 2, 4, 9] {
        let coefficients = transform(&samples, 1000, sweep, threads, QuadratureKind::Trapezoidal, None);
        let dc = coefficients.get(0).unwrap();
        assert_relative_eq!(dc.re, 0.999, epsilon = 1e-12);
    }
}

/// Default settings subsample each assignment to `depth` points, so worker
/// counts only agree up to the quadrature error of the coarser grid. For a
/// 5 Hz tone over one second at 48 kHz with depth 8192 the grids differ by a
/// few samples of tail plus an O((2π·f·h)²) panel error, well under 1e-3 of
/// the peak magnitude.
#[test]
fn test_default_config_thread_count_within_subsampling_tolerance() {
    let sample_rate = 48_000;
    let samples = cosine(5.0, sample_rate, 48_000);
    let sweep = FrequencySweep::new(0.0, 20.0, 21).unwrap();

    let run = |threads: usize| {
        let config = TransformConfig {
            threads,
            report_progress: false,
            ..TransformConfig::default()
        };
        assert!(config.depth.is_some());
        TransformEngine::new(sweep, &config)
            .unwrap()
            .run(Signal::new(&samples, sample_rate))
            .unwrap()
            .coefficients
    };

    let reference = run(1);
    let scale = reference.channel_peak(SpectrumChannel::Magnitude);
    assert_relative_eq!(scale, 0.5, epsilon = 1e-3);
    assert_eq!(reference.peak().unwrap().bin, 5);

    for threads in [2, 4, 5] {
        let other = run(threads);
        let divergence = max_divergence(&reference, &other);
        assert!(
            divergence <= 1e-3 * scale,
            "threads={} diverged by {:e}",
            threads,
            divergence
        );
        assert_eq!(other.peak().unwrap().bin, 5);
    }
}

#[test]
fn test_cosine_peaks_at_nearest_bin() {
    let sample_rate = 1000;
    let f0 = 12.3;
    let samples = cosine(f0, sample_rate, 2000);
    let sweep = FrequencySweep::new(0.0, 40.0, 161).unwrap();
    let expected = sweep.nearest_bin(f0);

    for (kind, depth) in [
        (QuadratureKind::Trapezoidal, None),
        (QuadratureKind::PointSum, None),
        (QuadratureKind::Trapezoidal, Some(256)),
        (QuadratureKind::PointSum, Some(256)),
    ] {
        let coefficients = transform(&samples, sample_rate, sweep, 4, kind, depth);
        let peak = coefficients.peak().unwrap();
        assert_eq!(peak.bin, expected, "{:?} depth {:?}", kind, depth);
    }
}

#[test]
fn test_point_sum_matches_reference_dft() {
    let n = 64;
    let mut rng = StdRng::seed_from_u64(42);
    let samples: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut buffer: Vec<Complex64> = samples.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    // Integer-Hz bins with one second of signal line up with the DFT bins.
    let sweep = FrequencySweep::new(0.0, 31.0, 32).unwrap();
    let coefficients = transform(&samples, n as u32, sweep, 3, QuadratureKind::PointSum, None);

    for (k, value) in coefficients.values().iter().enumerate() {
        let expected = buffer[k] / n as f64;
        assert!(
            (value - expected).norm() < 1e-9,
            "bin {}: {} vs {}",
            k,
            value,
            expected
        );
    }
}

#[test]
fn test_unscaled_point_sum_is_raw_sum() {
    let samples = cosine(5.0, 100, 100);
    let sweep = FrequencySweep::new(0.0, 10.0, 11).unwrap();
    let scaled = transform(&samples, 100, sweep, 2, QuadratureKind::PointSum, None);

    let config = TransformConfig {
        threads: 2,
        quadrature: QuadratureKind::PointSum,
        depth: None,
        normalization: Normalization::Unscaled,
        report_progress: false,
        ..TransformConfig::default()
    };
    let raw = TransformEngine::new(sweep, &config)
        .unwrap()
        .run(Signal::new(&samples, 100))
        .unwrap()
        .coefficients;

    for (s, r) in scaled.values().iter().zip(raw.values()) {
        assert_relative_eq!(s.re * 100.0, r.re, epsilon = 1e-9);
        assert_relative_eq!(s.im * 100.0, r.im, epsilon = 1e-9);
    }
}

#[test]
fn test_degenerate_sweep_repeats_coefficient() {
    let samples = cosine(3.0, 200, 400);
    let sweep = FrequencySweep::new(3.0, 3.0, 6).unwrap();
    let coefficients = transform(&samples, 200, sweep, 4, QuadratureKind::Trapezoidal, None);

    let first = coefficients.get(0).unwrap();
    assert!(first.norm() > 0.5);
    // Same frequency in every bin; only the cross-thread summation order differs.
    assert!(coefficients
        .values()
        .iter()
        .all(|&v| (v - first).norm() <= 1e-12 * first.norm()));
}

#[test]
fn test_inverse_synthesis_recovers_tone() {
    let sample_rate = 1000;
    let f0 = 50.0;
    let samples = cosine(f0, sample_rate, 1000);
    let sweep = FrequencySweep::new(0.0, 100.0, 201).unwrap();

    let coefficients = transform(&samples, sample_rate, sweep, 4, QuadratureKind::Trapezoidal, None);
    let rebuilt = InverseSynthesizer::default().synthesize(&coefficients, samples.len(), sample_rate);

    assert!(rebuilt.iter().any(|&x| x != 0.0));
    let recovered = dominant_frequency(&rebuilt, sample_rate, &sweep);
    assert!(
        (recovered - f0).abs() <= sweep.bin_width(),
        "recovered {} Hz, expected {} Hz",
        recovered,
        f0
    );
}
