// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 1001-1010
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Raster resolution is missing, malformed or zero
    pub const INVALID_RESOLUTION: i32 = 1001;

    /// Worker thread count must be positive
    pub const INVALID_THREAD_COUNT: i32 = 1002;

    /// Frequency sweep bounds or bin count are unusable
    pub const INVALID_SWEEP: i32 = 1003;

    /// Zoom window bounds are unusable
    pub const INVALID_ZOOM: i32 = 1004;

    /// Quadrature depth must be positive when given
    pub const INVALID_DEPTH: i32 = 1005;

    /// Sample rate must be positive
    pub const INVALID_SAMPLE_RATE: i32 = 1006;

    /// Synthetic signal description is unusable
    pub const INVALID_SIGNAL: i32 = 1007;

    /// Plot amplification or progress stride is unusable
    pub const INVALID_RENDER: i32 = 1008;

    /// Configuration file could not be read
    pub const READ_FAILED: i32 = 1009;

    /// Configuration file is not valid JSON for the config schema
    pub const PARSE_FAILED: i32 = 1010;
}

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=Config, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration errors
///
/// Every variant is fatal: the run stops before any sample is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Resolution is not of the form `WxH` with both sides non-zero
    InvalidResolution { input: String },

    /// Thread count is zero
    InvalidThreadCount { threads: usize },

    /// Sweep bounds are not finite, reversed, or too few bins
    InvalidSweep { reason: String },

    /// Zoom window is not finite or reversed
    InvalidZoom { reason: String },

    /// Quadrature depth of zero
    InvalidDepth { depth: usize },

    /// Sample rate of zero
    InvalidSampleRate { sample_rate: u32 },

    /// Synthetic tone list or duration is unusable
    InvalidSignal { reason: String },

    /// Amplification or progress stride is unusable
    InvalidRender { reason: String },

    /// Config file could not be read
    ReadFailed { path: String, reason: String },

    /// Config file could not be parsed
    ParseFailed { path: String, reason: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidResolution { .. } => ConfigErrorCodes::INVALID_RESOLUTION,
            ConfigError::InvalidThreadCount { .. } => ConfigErrorCodes::INVALID_THREAD_COUNT,
            ConfigError::InvalidSweep { .. } => ConfigErrorCodes::INVALID_SWEEP,
            ConfigError::InvalidZoom { .. } => ConfigErrorCodes::INVALID_ZOOM,
            ConfigError::InvalidDepth { .. } => ConfigErrorCodes::INVALID_DEPTH,
            ConfigError::InvalidSampleRate { .. } => ConfigErrorCodes::INVALID_SAMPLE_RATE,
            ConfigError::InvalidSignal { .. } => ConfigErrorCodes::INVALID_SIGNAL,
            ConfigError::InvalidRender { .. } => ConfigErrorCodes::INVALID_RENDER,
            ConfigError::ReadFailed { .. } => ConfigErrorCodes::READ_FAILED,
            ConfigError::ParseFailed { .. } => ConfigErrorCodes::PARSE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidResolution { input } => {
                format!(
                    "Please specify render resolution as WIDTHxHEIGHT with non-zero sides (got '{}')",
                    input
                )
            }
            ConfigError::InvalidThreadCount { threads } => {
                format!("Thread count must be greater than 0 (got {})", threads)
            }
            ConfigError::InvalidSweep { reason } => format!("Invalid frequency sweep: {}", reason),
            ConfigError::InvalidZoom { reason } => format!("Invalid zoom range: {}", reason),
            ConfigError::InvalidDepth { depth } => {
                format!("Quadrature depth must be greater than 0 (got {})", depth)
            }
            ConfigError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            ConfigError::InvalidSignal { reason } => format!("Invalid signal: {}", reason),
            ConfigError::InvalidRender { reason } => format!("Invalid render settings: {}", reason),
            ConfigError::ReadFailed { path, reason } => {
                format!("Failed to read config file {}: {}", path, reason)
            }
            ConfigError::ParseFailed { path, reason } => {
                format!("Failed to parse config file {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
