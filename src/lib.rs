// Spectral Sweep Core - parallel frequency-domain analysis
// Swept quadrature transform, spectrum raster rendering and inverse synthesis

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;

// Re-exports for convenience
pub use config::AppConfig;
pub use error::{ErrorCode, PipelineError};
pub use pipeline::{run_pipeline, PipelineOutput, RunReport};

use tracing::Level;

/// Install the stderr log subscriber
///
/// Stdout carries the raster, so every diagnostic goes to stderr. Calling
/// this more than once is harmless; later calls keep the first subscriber.
pub fn init_logging(level: Level) {
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_ok() {
        tracing::debug!("[Logging] Initialized at level {}", level);
    }
}
