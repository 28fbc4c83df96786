/*!
# Galaxy 3D Compute

GPU compute abstraction layer for the Galaxy 3D engine.

Kernels are described once (workgroup size, buffer bindings, optional CPU
implementation) and dispatched through a `Context` that hides which backend
actually runs them. At construction the context probes the installed drivers
and falls back through a fixed priority list down to the software executor,
which is always available and runs kernels on a bounded worker pool.

## Architecture

- **Backend**: SPIR-V (Vulkan, OpenCL), PTX, AMDGCN or software, with driver probes
- **BufferPool**: generation-checked buffer arena with a byte budget
- **Kernel / KernelBuilder**: immutable kernel description with typed CPU fallback
- **CommandQueue**: FIFO of pending dispatches, flushed by `Context::sync`
- **Executor**: parallel CPU execution of kernel fallbacks
- **Context**: the facade tying everything together

Backend crates (e.g. `galaxy_3d_compute_vulkan`) plug in device probes
through `register_device_probe`.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod compute;
pub mod platform;
pub mod utils;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (global logger)
    pub use crate::engine::Engine;

    // Compute context, the main entry point
    pub use crate::compute::Context;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Compute sub-module with all compute types
    pub mod compute {
        pub use crate::compute::*;
    }
}

// Re-export math library at crate root
pub use glam;
