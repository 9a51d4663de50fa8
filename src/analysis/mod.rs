// Analysis module - spectral sweep DSP
//
// Architecture:
// - FrequencySweep: the bins to evaluate
// - Quadrature: per-assignment numerical integration (point-sum or trapezoidal)
// - TransformEngine: partitions samples over worker threads and reduces into
//   a single-mutex coefficient accumulator
// - InverseSynthesizer: rebuilds samples from the finished coefficients

pub mod coefficients;
pub mod progress;
pub mod quadrature;
pub mod sweep;
pub mod synthesis;
pub mod transform;

pub use coefficients::{CoefficientArray, SpectrumChannel, SpectrumPeak};
pub use quadrature::{Normalization, Quadrature, QuadratureKind, QuadratureStrategy, Signal};
pub use sweep::FrequencySweep;
pub use synthesis::InverseSynthesizer;
pub use transform::{partition, TransformEngine, TransformOutput, WorkAssignment, WorkerReport};

#[cfg(test)]
mod tests;
