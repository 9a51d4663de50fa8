// Transform error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Transform error code constants
///
/// Error code range: 2001-2005
pub struct TransformErrorCodes {}

impl TransformErrorCodes {
    /// Sample buffer holds no samples
    pub const EMPTY_INPUT: i32 = 2001;

    /// Coefficient storage could not be allocated
    pub const ALLOCATION_FAILED: i32 = 2002;

    /// A worker thread could not be created
    pub const THREAD_SPAWN_FAILED: i32 = 2003;

    /// A worker thread panicked before it could be joined
    pub const THREAD_JOIN_FAILED: i32 = 2004;

    /// The reduction lock was poisoned
    pub const LOCK_POISONED: i32 = 2005;
}

/// Log a transform error with structured context
pub fn log_transform_error(err: &TransformError, context: &str) {
    error!(
        "Transform error in {}: code={}, component=TransformEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Transform-phase errors
///
/// These cover the parallel integration phase: allocation of the shared
/// accumulator and the lifecycle of the worker threads.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Nothing to integrate
    EmptyInput,

    /// Allocation of `requested` elements for `what` failed
    AllocationFailed { what: String, requested: usize },

    /// Thread creation failed
    ThreadSpawnFailed { thread: usize, reason: String },

    /// Worker thread panicked
    ThreadJoinFailed { thread: usize },

    /// Mutex was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for TransformError {
    fn code(&self) -> i32 {
        match self {
            TransformError::EmptyInput => TransformErrorCodes::EMPTY_INPUT,
            TransformError::AllocationFailed { .. } => TransformErrorCodes::ALLOCATION_FAILED,
            TransformError::ThreadSpawnFailed { .. } => TransformErrorCodes::THREAD_SPAWN_FAILED,
            TransformError::ThreadJoinFailed { .. } => TransformErrorCodes::THREAD_JOIN_FAILED,
            TransformError::LockPoisoned { .. } => TransformErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            TransformError::EmptyInput => "Sample buffer is empty; nothing to transform".to_string(),
            TransformError::AllocationFailed { what, requested } => {
                format!("malloc: failed to allocate {} ({} elements)", what, requested)
            }
            TransformError::ThreadSpawnFailed { thread, reason } => {
                format!("pthread_create: worker {} failed to start: {}", thread, reason)
            }
            TransformError::ThreadJoinFailed { thread } => {
                format!("pthread_join: worker {} panicked", thread)
            }
            TransformError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransformError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TransformError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_codes() {
        assert_eq!(
            TransformError::EmptyInput.code(),
            TransformErrorCodes::EMPTY_INPUT
        );
        assert_eq!(
            TransformError::ThreadSpawnFailed {
                thread: 1,
                reason: "test".to_string()
            }
            .code(),
            TransformErrorCodes::THREAD_SPAWN_FAILED
        );
        assert_eq!(
            TransformError::ThreadJoinFailed { thread: 3 }.code(),
            TransformErrorCodes::THREAD_JOIN_FAILED
        );
        assert_eq!(
            TransformError::LockPoisoned {
                component: "coefficients".to_string()
            }
            .code(),
            TransformErrorCodes::LOCK_POISONED
        );
    }

    #[test]
    fn test_transform_error_messages_name_operation() {
        let err = TransformError::AllocationFailed {
            what: "coefficient array".to_string(),
            requested: 16,
        };
        assert!(err.message().starts_with("malloc"));

        let err = TransformError::ThreadJoinFailed { thread: 2 };
        assert_eq!(err.message(), "pthread_join: worker 2 panicked");
    }
}
