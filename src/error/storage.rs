// Storage error types and constants
//
// Covers sample buffers (heap and memory-mapped), WAV decoding, raster
// allocation and the final raster stream write.

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Storage error code constants
///
/// Error code range: 3001-3009
pub struct StorageErrorCodes {}

impl StorageErrorCodes {
    /// File could not be opened, created or stat'ed
    pub const OPEN_FAILED: i32 = 3001;

    /// File could not be memory mapped
    pub const MAP_FAILED: i32 = 3002;

    /// File could not be resized to the requested length
    pub const RESIZE_FAILED: i32 = 3003;

    /// Mapped region could not be synced to its backing file
    pub const FLUSH_FAILED: i32 = 3004;

    /// Write requested on a read-only buffer
    pub const READ_ONLY: i32 = 3005;

    /// Mapped bytes are not aligned for f64 access
    pub const MISALIGNED: i32 = 3006;

    /// Input file could not be decoded
    pub const DECODE_FAILED: i32 = 3007;

    /// Output stream accepted fewer bytes than requested
    pub const SHORT_WRITE: i32 = 3008;

    /// Buffer allocation failed
    pub const ALLOCATION_FAILED: i32 = 3009;
}

/// Log a storage error with structured context
pub fn log_storage_error(err: &StorageError, context: &str) {
    error!(
        "Storage error in {}: code={}, component=Storage, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Storage errors
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    OpenFailed { path: String, reason: String },
    MapFailed { path: String, reason: String },
    ResizeFailed { path: String, reason: String },
    FlushFailed { path: String, reason: String },
    ReadOnly,
    Misaligned { path: String },
    DecodeFailed { path: String, reason: String },
    ShortWrite { expected: usize, reason: String },
    AllocationFailed { what: String, requested: usize },
}

impl ErrorCode for StorageError {
    fn code(&self) -> i32 {
        match self {
            StorageError::OpenFailed { .. } => StorageErrorCodes::OPEN_FAILED,
            StorageError::MapFailed { .. } => StorageErrorCodes::MAP_FAILED,
            StorageError::ResizeFailed { .. } => StorageErrorCodes::RESIZE_FAILED,
            StorageError::FlushFailed { .. } => StorageErrorCodes::FLUSH_FAILED,
            StorageError::ReadOnly => StorageErrorCodes::READ_ONLY,
            StorageError::Misaligned { .. } => StorageErrorCodes::MISALIGNED,
            StorageError::DecodeFailed { .. } => StorageErrorCodes::DECODE_FAILED,
            StorageError::ShortWrite { .. } => StorageErrorCodes::SHORT_WRITE,
            StorageError::AllocationFailed { .. } => StorageErrorCodes::ALLOCATION_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            StorageError::OpenFailed { path, reason } => format!("open {}: {}", path, reason),
            StorageError::MapFailed { path, reason } => format!("mmap {}: {}", path, reason),
            StorageError::ResizeFailed { path, reason } => {
                format!("ftruncate {}: {}", path, reason)
            }
            StorageError::FlushFailed { path, reason } => format!("msync {}: {}", path, reason),
            StorageError::ReadOnly => "Sample buffer is read-only".to_string(),
            StorageError::Misaligned { path } => {
                format!("{} is not aligned for 8-byte samples", path)
            }
            StorageError::DecodeFailed { path, reason } => {
                format!("Failed to decode {}: {}", path, reason)
            }
            StorageError::ShortWrite { expected, reason } => {
                format!("write: short write of {} bytes: {}", expected, reason)
            }
            StorageError::AllocationFailed { what, requested } => {
                format!("malloc: failed to allocate {} ({} elements)", what, requested)
            }
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StorageError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StorageError {}
