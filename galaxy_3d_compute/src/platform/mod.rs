//! Platform layer: host facilities the compute layer consumes
//!
//! Only the dynamic-library probe lives here; it answers "is this driver
//! installed" without ever calling into the loaded library.

pub mod dynamic_library;
