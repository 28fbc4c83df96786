//! Error types for the Galaxy3D compute layer
//!
//! This module defines the error types used throughout the compute layer,
//! including buffer management, kernel execution and backend initialization.

use std::fmt;
use crate::compute::BufferHandle;

/// Result type for Galaxy3D compute operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D compute errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer allocation would exceed the pool budget (pool left unchanged)
    OutOfMemory {
        /// Bytes requested by the failed allocation
        requested: u64,
        /// Bytes still available in the pool
        available: u64,
    },

    /// Stale or out-of-range buffer handle
    InvalidHandle(BufferHandle),

    /// Upload payload larger than the buffer capacity
    BufferTooSmall {
        /// Payload size in bytes
        size: u64,
        /// Buffer capacity in bytes
        capacity: u64,
    },

    /// CPU execution requested for a kernel without a CPU fallback
    NoCpuFallback(String),

    /// Binding slot missing or accessed against its access mode
    InvalidBinding(String),

    /// A kernel's CPU fallback reported a failure or panicked
    KernelFailed(String),

    /// Dispatch grid too large to address (global ids past `u32::MAX`)
    InvalidDispatch(String),

    /// Backend-specific error
    BackendError(String),

    /// Initialization failed (context, worker pool, backend plugin)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory { requested, available } => write!(
                f,
                "Out of buffer pool memory: requested {} bytes, {} available",
                requested, available
            ),
            Error::InvalidHandle(handle) => write!(f, "Invalid buffer handle: {}", handle),
            Error::BufferTooSmall { size, capacity } => write!(
                f,
                "Buffer too small: {} bytes do not fit in {} bytes",
                size, capacity
            ),
            Error::NoCpuFallback(kernel) => write!(f, "Kernel '{}' has no CPU fallback", kernel),
            Error::InvalidBinding(msg) => write!(f, "Invalid binding: {}", msg),
            Error::KernelFailed(msg) => write!(f, "Kernel failed: {}", msg),
            Error::InvalidDispatch(msg) => write!(f, "Invalid dispatch: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
