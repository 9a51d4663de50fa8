// Error types for the spectral sweep pipeline
//
// This module defines custom error types for configuration, transform and
// storage operations, providing structured error handling with numeric codes
// so the CLI and the run report can identify the failing stage.

mod config;
mod storage;
mod transform;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use storage::{log_storage_error, StorageError, StorageErrorCodes};
pub use transform::{log_transform_error, TransformError, TransformErrorCodes};

use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting across the
/// library and the command-line front end.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Any failure raised while running the full analysis pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Config(ConfigError),
    Transform(TransformError),
    Storage(StorageError),
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Config(err) => err.code(),
            PipelineError::Transform(err) => err.code(),
            PipelineError::Storage(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Config(err) => err.message(),
            PipelineError::Transform(err) => err.message(),
            PipelineError::Storage(err) => err.message(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(err) => err.fmt(f),
            PipelineError::Transform(err) => err.fmt(f),
            PipelineError::Storage(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

impl From<TransformError> for PipelineError {
    fn from(err: TransformError) -> Self {
        PipelineError::Transform(err)
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        PipelineError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_delegates_code() {
        let err: PipelineError = TransformError::EmptyInput.into();
        assert_eq!(err.code(), TransformErrorCodes::EMPTY_INPUT);

        let err: PipelineError = ConfigError::InvalidThreadCount { threads: 0 }.into();
        assert_eq!(err.code(), ConfigErrorCodes::INVALID_THREAD_COUNT);
        assert!(err.to_string().contains("ConfigError"));
    }
}
