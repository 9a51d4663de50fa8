// Transform module - parallel sweep over a partitioned sample buffer
//
// Architecture:
// - partition(): splits [0, N) into T disjoint contiguous assignments
// - one scoped OS thread per assignment, created for this run only
// - every worker walks the full sweep in increasing bin order and adds its
//   partial integral into the shared accumulator under the reduction lock
// - the coefficient array is only handed out after every worker has joined
//
// Splitting the domain is valid because the integral over [0, D) equals the
// sum of the integrals over any partition of it.

use std::f64::consts::PI;
use std::thread;
use std::time::{Duration, Instant};

use rustfft::num_complex::Complex64;
use serde::Serialize;

use super::coefficients::{CoefficientArray, SharedCoefficients};
use super::progress::ProgressReporter;
use super::quadrature::{
    Normalization, Quadrature, QuadratureKind, QuadratureStrategy, SamplePoints, Signal,
};
use super::sweep::FrequencySweep;
use crate::config::TransformConfig;
use crate::error::{ConfigError, TransformError};

/// Half-open sample range `[start, end)` owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkAssignment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl WorkAssignment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.start..self.end).contains(&n)
    }
}

/// Split `[0, num_samples)` into `threads` near-equal contiguous ranges
///
/// Range `i` is `[i*N/T, (i+1)*N/T)`. When there are more threads than
/// samples some ranges are empty.
///
/// # Panics
/// Panics if `threads` is zero.
pub fn partition(num_samples: usize, threads: usize) -> Vec<WorkAssignment> {
    assert!(threads > 0, "threads must be greater than 0");
    let bound = |i: usize| (i as u128 * num_samples as u128 / threads as u128) as usize;
    (0..threads)
        .map(|index| WorkAssignment {
            index,
            start: bound(index),
            end: bound(index + 1),
        })
        .collect()
}

/// Everything one worker owns for the duration of the phase
struct WorkerContext {
    assignment: WorkAssignment,
    progress: Option<ProgressReporter>,
}

/// What a worker did, returned through its join handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkerReport {
    pub assignment: WorkAssignment,
    pub points_per_bin: usize,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

/// Coefficients plus per-worker bookkeeping
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub coefficients: CoefficientArray,
    pub workers: Vec<WorkerReport>,
    pub elapsed: Duration,
}

/// Parallel quadrature over a frequency sweep
#[derive(Debug, Clone)]
pub struct TransformEngine {
    sweep: FrequencySweep,
    threads: usize,
    strategy: QuadratureStrategy,
    depth: Option<usize>,
    normalization: Normalization,
    progress_stride: usize,
    report_progress: bool,
}

impl TransformEngine {
    /// Create an engine from validated transform settings
    ///
    /// # Errors
    /// `ConfigError` when the thread count, depth or progress stride is zero.
    pub fn new(sweep: FrequencySweep, config: &TransformConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sweep,
            threads: config.threads,
            strategy: QuadratureStrategy::from_kind(config.quadrature, config.depth),
            depth: config.depth,
            normalization: config.normalization,
            progress_stride: config.progress_stride,
            report_progress: config.report_progress,
        })
    }

    pub fn sweep(&self) -> &FrequencySweep {
        &self.sweep
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn quadrature(&self) -> QuadratureKind {
        self.strategy.kind()
    }

    /// Run the parallel phase to completion
    ///
    /// # Errors
    /// - `TransformError::EmptyInput` for an empty signal
    /// - `TransformError::AllocationFailed` if the accumulator cannot be allocated
    /// - `TransformError::ThreadSpawnFailed` / `ThreadJoinFailed` for worker lifecycle failures
    /// - `TransformError::LockPoisoned` if the reduction lock is poisoned
    pub fn run(&self, signal: Signal<'_>) -> Result<TransformOutput, TransformError> {
        if signal.is_empty() {
            return Err(TransformError::EmptyInput);
        }

        let assignments = partition(signal.len(), self.threads);
        let accumulator = SharedCoefficients::zeroed(self.sweep.len())?;
        let started = Instant::now();

        tracing::info!(
            "[TransformEngine] Sweeping {} bins ({:.3}-{:.3} Hz) over {} samples with {} threads ({}, depth {:?})",
            self.sweep.len(),
            self.sweep.min_freq(),
            self.sweep.max_freq(),
            signal.len(),
            self.threads,
            self.strategy.kind().display_name(),
            self.depth
        );

        let workers = thread::scope(|scope| {
            let signal = &signal;
            let accumulator = &accumulator;
            let mut handles = Vec::with_capacity(assignments.len());
            let mut spawn_error = None;

            for assignment in &assignments {
                let context = WorkerContext {
                    assignment: *assignment,
                    progress: (assignment.index == 0 && self.report_progress).then(|| {
                        ProgressReporter::stderr("transform", self.sweep.len(), self.progress_stride)
                    }),
                };

                let spawned = thread::Builder::new()
                    .name(format!("sweep-worker-{}", assignment.index))
                    .spawn_scoped(scope, move || self.work(context, signal, accumulator));

                match spawned {
                    Ok(handle) => handles.push((assignment.index, handle)),
                    Err(err) => {
                        spawn_error = Some(TransformError::ThreadSpawnFailed {
                            thread: assignment.index,
                            reason: err.to_string(),
                        });
                        break;
                    }
                }
            }

            // Join everything that started before reporting any failure.
            let mut first_error = spawn_error;
            let mut reports = Vec::with_capacity(handles.len());
            for (index, handle) in handles {
                match handle.join() {
                    Ok(Ok(report)) => reports.push(report),
                    Ok(Err(err)) => {
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                    Err(_) => {
                        if first_error.is_none() {
                            first_error = Some(TransformError::ThreadJoinFailed { thread: index });
                        }
                    }
                }
            }

            match first_error {
                Some(err) => Err(err),
                None => Ok(reports),
            }
        })?;

        let coefficients = accumulator.into_array(self.sweep)?;
        let elapsed = started.elapsed();
        tracing::info!(
            "[TransformEngine] Joined {} workers after {:.1} ms",
            workers.len(),
            elapsed.as_secs_f64() * 1_000.0
        );

        Ok(TransformOutput {
            coefficients,
            workers,
            elapsed,
        })
    }

    fn work(
        &self,
        mut context: WorkerContext,
        signal: &Signal<'_>,
        accumulator: &SharedCoefficients,
    ) -> Result<WorkerReport, TransformError> {
        let started = Instant::now();
        let assignment = context.assignment;
        let weight = match self.normalization {
            Normalization::Integral => self.strategy.integral_weight(&assignment, signal),
            Normalization::Unscaled => 1.0,
        };

        for (k, freq) in self.sweep.iter() {
            let precompute = Complex64::new(0.0, -2.0 * PI * freq);
            let partial = self.strategy.integrate(precompute, &assignment, signal) * weight;
            accumulator.add(k, partial)?;

            if let Some(progress) = context.progress.as_mut() {
                progress.tick(k);
            }
        }

        if let Some(progress) = context.progress.as_mut() {
            progress.finish();
        }

        let elapsed = started.elapsed();
        tracing::debug!(
            "[TransformEngine] Worker {} finished [{}, {}) in {:.1} ms",
            assignment.index,
            assignment.start,
            assignment.end,
            elapsed.as_secs_f64() * 1_000.0
        );

        Ok(WorkerReport {
            assignment,
            points_per_bin: SamplePoints::new(&assignment, self.depth).count(),
            elapsed,
        })
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(sweep: FrequencySweep, threads: usize, kind: QuadratureKind) -> TransformEngine {
        let config = TransformConfig {
            threads,
            quadrature: kind,
            depth: None,
            report_progress: false,
            ..TransformConfig::default()
        };
        TransformEngine::new(sweep, &config).unwrap()
    }

    #[test]
    fn test_partition_covers_every_index_once() {
        for &(n, t) in &[(10usize, 3usize), (480_000, 4), (7, 7), (3, 8), (1, 1), (1000, 6)] {
            let assignments = partition(n, t);
            assert_eq!(assignments.len(), t);

            let mut owner: Vec<Option<usize>> = vec![None; n];
            for assignment in &assignments {
                for i in assignment.start..assignment.end {
                    assert!(owner[i].is_none(), "index {} assigned twice", i);
                    owner[i] = Some(assignment.index);
                }
            }
            assert!(owner.iter().all(Option::is_some), "gap in partition of {}", n);
            assert_eq!(assignments.first().unwrap().start, 0);
            assert_eq!(assignments.last().unwrap().end, n);
        }
    }

    #[test]
    fn test_partition_sizes_are_near_equal() {
        let assignments = partition(10, 3);
        let sizes: Vec<usize> = assignments.iter().map(WorkAssignment::len).collect();
        assert_eq!(sizes, vec![3, 3, 4]);
    }

    #[test]
    fn test_empty_signal_is_rejected() {
        let sweep = FrequencySweep::new(0.0, 10.0, 4).unwrap();
        let samples: Vec<f64> = Vec::new();
        let result = engine(sweep, 2, QuadratureKind::Trapezoidal).run(Signal::new(&samples, 100));
        assert_eq!(result.unwrap_err(), TransformError::EmptyInput);
    }

    #[test]
    fn test_more_threads_than_samples() {
        let sweep = FrequencySweep::new(0.0, 1.0, 3).unwrap();
        let samples = vec![1.0, 1.0, 1.0];
        let output = engine(sweep, 8, QuadratureKind::PointSum)
            .run(Signal::new(&samples, 3))
            .unwrap();
        assert_eq!(output.workers.len(), 8);
        // Zero frequency: the integral of 1.0 over one second.
        let dc = output.coefficients.get(0).unwrap();
        assert!((dc.re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_zero_threads() {
        let sweep = FrequencySweep::new(0.0, 1.0, 3).unwrap();
        let config = TransformConfig {
            threads: 0,
            ..TransformConfig::default()
        };
        assert!(matches!(
            TransformEngine::new(sweep, &config),
            Err(ConfigError::InvalidThreadCount { threads: 0 })
        ));
    }
}
