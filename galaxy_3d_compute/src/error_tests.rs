//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::compute::BufferHandle;
use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory { requested: 512, available: 128 };
    let display = format!("{}", err);
    assert!(display.contains("Out of buffer pool memory"));
    assert!(display.contains("512"));
    assert!(display.contains("128"));
}

#[test]
fn test_invalid_handle_display() {
    let err = Error::InvalidHandle(BufferHandle::new(3, 7));
    let display = format!("{}", err);
    assert!(display.contains("Invalid buffer handle"));
    assert!(display.contains("3v7"));
}

#[test]
fn test_buffer_too_small_display() {
    let err = Error::BufferTooSmall { size: 16, capacity: 8 };
    let display = format!("{}", err);
    assert_eq!(display, "Buffer too small: 16 bytes do not fit in 8 bytes");
}

#[test]
fn test_no_cpu_fallback_display() {
    let err = Error::NoCpuFallback("terrain_noise".to_string());
    assert_eq!(format!("{}", err), "Kernel 'terrain_noise' has no CPU fallback");
}

#[test]
fn test_message_variants_display() {
    let err = Error::InvalidBinding("slot 2 is read-only".to_string());
    assert!(format!("{}", err).contains("slot 2 is read-only"));

    let err = Error::KernelFailed("index out of range".to_string());
    assert!(format!("{}", err).starts_with("Kernel failed"));

    let err = Error::InvalidDispatch("grid x overflows".to_string());
    assert_eq!(format!("{}", err), "Invalid dispatch: grid x overflows");

    let err = Error::BackendError("vkCreateInstance returned -9".to_string());
    assert!(format!("{}", err).contains("Backend error"));

    let err = Error::InitializationFailed("worker pool".to_string());
    assert!(format!("{}", err).contains("Initialization failed"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::NoCpuFallback("k".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::OutOfMemory { requested: 1, available: 0 });
    assert!(debug.contains("OutOfMemory"));

    let debug = format!("{:?}", Error::InvalidHandle(BufferHandle::new(0, 0)));
    assert!(debug.contains("InvalidHandle"));
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::BufferTooSmall { size: 4, capacity: 2 };
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::BufferTooSmall { size: 4, capacity: 3 });
}

// ============================================================================
// RESULT TYPE TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::NoCpuFallback("inner".to_string()))
    }

    fn outer() -> Result<u32> {
        inner()?;
        Ok(42)
    }

    assert_eq!(outer(), Err(Error::NoCpuFallback("inner".to_string())));
}
