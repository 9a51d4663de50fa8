// Quadrature module - numerical integration over one work assignment
//
// Each strategy turns a frequency (pre-folded into `precompute = -2πi·f`)
// and a contiguous sample range into one complex partial integral. The
// transform engine sums the partials of all workers.

use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::transform::WorkAssignment;

/// Read-only view of the samples being analysed
#[derive(Debug, Clone, Copy)]
pub struct Signal<'a> {
    samples: &'a [f64],
    sample_rate: f64,
}

impl<'a> Signal<'a> {
    pub fn new(samples: &'a [f64], sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate as f64,
        }
    }

    pub fn samples(&self) -> &'a [f64] {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Time of sample `n` in seconds
    pub fn time(&self, n: usize) -> f64 {
        n as f64 / self.sample_rate
    }

    /// `sample[n] * e^(precompute * t(n))`
    pub fn evaluate(&self, precompute: Complex64, n: usize) -> Complex64 {
        (precompute * self.time(n)).exp() * self.samples[n]
    }
}

/// Selectable integration method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureKind {
    /// Direct weighted summation of the selected points
    PointSum,
    /// Trapezoidal panels between adjacent selected points
    #[default]
    Trapezoidal,
}

impl QuadratureKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            QuadratureKind::PointSum => "point-sum",
            QuadratureKind::Trapezoidal => "trapezoidal",
        }
    }
}

/// Scaling applied to point-sum partials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Each point-sum term is weighted by the time span it stands for, so both
    /// strategies estimate the same definite integral
    #[default]
    Integral,
    /// Point sums are left as raw sums
    Unscaled,
}

/// Numerical integration of one frequency over one assignment
pub trait Quadrature: Send + Sync {
    /// Complex partial integral for `precompute = -2πi·freq`
    fn integrate(
        &self,
        precompute: Complex64,
        assignment: &WorkAssignment,
        signal: &Signal<'_>,
    ) -> Complex64;

    /// Factor that turns `integrate` into an integral estimate
    fn integral_weight(&self, _assignment: &WorkAssignment, _signal: &Signal<'_>) -> f64 {
        1.0
    }

    fn kind(&self) -> QuadratureKind;
}

/// Evenly spaced sample indices inside an assignment
///
/// Index `j` maps to `start + j * len / taken`, widened like `partition` so
/// long ranges cannot overflow. `taken` is the requested depth capped at the
/// range length, so no index repeats.
#[derive(Debug, Clone, Copy)]
pub struct SamplePoints {
    start: usize,
    len: usize,
    taken: usize,
}

impl SamplePoints {
    pub fn new(assignment: &WorkAssignment, depth: Option<usize>) -> Self {
        let len = assignment.len();
        let taken = depth.map_or(len, |d| d.min(len));
        Self {
            start: assignment.start,
            len,
            taken,
        }
    }

    /// Number of selected points
    pub fn count(&self) -> usize {
        self.taken
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.taken).map(move |j| {
            self.start + (j as u128 * self.len as u128 / self.taken as u128) as usize
        })
    }
}

/// Unscaled Riemann sum over the selected points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointSum {
    pub depth: Option<usize>,
}

impl Quadrature for PointSum {
    fn integrate(
        &self,
        precompute: Complex64,
        assignment: &WorkAssignment,
        signal: &Signal<'_>,
    ) -> Complex64 {
        SamplePoints::new(assignment, self.depth)
            .iter()
            .map(|n| signal.evaluate(precompute, n))
            .sum()
    }

    /// Seconds covered by each selected point
    fn integral_weight(&self, assignment: &WorkAssignment, signal: &Signal<'_>) -> f64 {
        let points = SamplePoints::new(assignment, self.depth);
        if points.count() == 0 {
            return 0.0;
        }
        assignment.len() as f64 / (points.count() as f64 * signal.sample_rate())
    }

    fn kind(&self) -> QuadratureKind {
        QuadratureKind::PointSum
    }
}

/// Trapezoidal rule over the selected points
///
/// Each assignment also owns the panel from its last selected point to the
/// first sample of the next assignment, so the partials of any partition add
/// up to the same integral over `[t(0), t(N-1)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trapezoidal {
    pub depth: Option<usize>,
}

impl Quadrature for Trapezoidal {
    fn integrate(
        &self,
        precompute: Complex64,
        assignment: &WorkAssignment,
        signal: &Signal<'_>,
    ) -> Complex64 {
        let points = SamplePoints::new(assignment, self.depth);
        if points.count() == 0 {
            return Complex64::new(0.0, 0.0);
        }

        // The next assignment always selects its own start first.
        let seam = (assignment.end < signal.len()).then_some(assignment.end);
        let mut evaluated = points
            .iter()
            .chain(seam)
            .map(|n| (signal.time(n), signal.evaluate(precompute, n)));

        // A single point at the end of the signal spans no panel.
        let Some((mut t1, mut v1)) = evaluated.next() else {
            return Complex64::new(0.0, 0.0);
        };

        let mut area = Complex64::new(0.0, 0.0);
        for (t2, v2) in evaluated {
            area += (v1 + v2) * (0.5 * (t2 - t1));
            t1 = t2;
            v1 = v2;
        }
        area
    }

    fn kind(&self) -> QuadratureKind {
        QuadratureKind::Trapezoidal
    }
}

/// Strategy chosen once at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadratureStrategy {
    PointSum(PointSum),
    Trapezoidal(Trapezoidal),
}

impl QuadratureStrategy {
    pub fn from_kind(kind: QuadratureKind, depth: Option<usize>) -> Self {
        match kind {
            QuadratureKind::PointSum => QuadratureStrategy::PointSum(PointSum { depth }),
            QuadratureKind::Trapezoidal => QuadratureStrategy::Trapezoidal(Trapezoidal { depth }),
        }
    }

    fn as_dyn(&self) -> &dyn Quadrature {
        match self {
            QuadratureStrategy::PointSum(q) => q,
            QuadratureStrategy::Trapezoidal(q) => q,
        }
    }
}

impl Quadrature for QuadratureStrategy {
    fn integrate(
        &self,
        precompute: Complex64,
        assignment: &WorkAssignment,
        signal: &Signal<'_>,
    ) -> Complex64 {
        self.as_dyn().integrate(precompute, assignment, signal)
    }

    fn integral_weight(&self, assignment: &WorkAssignment, signal: &Signal<'_>) -> f64 {
        self.as_dyn().integral_weight(assignment, signal)
    }

    fn kind(&self) -> QuadratureKind {
        self.as_dyn().kind()
    }
}
