/// Compute module - backends, buffers, kernels and the compute context

// Module declarations
pub mod backend;
pub mod buffer;
pub mod buffer_pool;
pub mod kernel;
pub mod kernel_args;
pub mod command_queue;
pub mod executor;
pub mod device_info;
pub mod config;
pub mod context;

// Re-export everything
pub use backend::*;
pub use buffer::*;
pub use buffer_pool::*;
pub use kernel::*;
pub use kernel_args::*;
pub use command_queue::*;
pub use executor::*;
pub use device_info::*;
pub use config::*;
pub use context::*;
