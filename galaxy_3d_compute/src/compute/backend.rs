/// Compute backends and the backend fallback cascade
///
/// `Backend` is a closed set: four hardware targets plus the software
/// target, which is always available. Hardware variants are probed by
/// looking for their driver library; their native dispatch path is not
/// implemented yet, so every command they receive runs on the CPU executor.

use std::fmt;
use crate::compute::Command;
use crate::platform::dynamic_library;
use crate::{engine_debug, engine_info, engine_warn};

/// Compute backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// SPIR-V kernels dispatched through Vulkan compute queues
    SpirvVulkan,
    /// SPIR-V kernels dispatched through OpenCL
    SpirvOpenCl,
    /// PTX kernels dispatched through the CUDA driver
    Nvptx,
    /// AMDGCN kernels dispatched through HIP
    Amdgcn,
    /// Multi-threaded CPU execution of kernel fallbacks (always available)
    Software,
}

/// Hardware candidates tried, in order, when the preferred backend is unavailable
pub const FALLBACK_PRIORITY: [Backend; 4] = [
    Backend::SpirvVulkan,
    Backend::Nvptx,
    Backend::Amdgcn,
    Backend::SpirvOpenCl,
];

// ===== DRIVER LIBRARIES =====

#[cfg(target_os = "windows")]
const VULKAN_LIBRARIES: &[&str] = &["vulkan-1.dll"];
#[cfg(target_os = "macos")]
const VULKAN_LIBRARIES: &[&str] = &["libvulkan.1.dylib", "libvulkan.dylib", "libMoltenVK.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const VULKAN_LIBRARIES: &[&str] = &["libvulkan.so.1", "libvulkan.so"];

#[cfg(target_os = "windows")]
const OPENCL_LIBRARIES: &[&str] = &["OpenCL.dll"];
#[cfg(target_os = "macos")]
const OPENCL_LIBRARIES: &[&str] = &["/System/Library/Frameworks/OpenCL.framework/OpenCL"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENCL_LIBRARIES: &[&str] = &["libOpenCL.so.1", "libOpenCL.so"];

#[cfg(target_os = "windows")]
const CUDA_LIBRARIES: &[&str] = &["nvcuda.dll"];
#[cfg(not(target_os = "windows"))]
const CUDA_LIBRARIES: &[&str] = &["libcuda.so.1", "libcuda.so"];

#[cfg(target_os = "windows")]
const HIP_LIBRARIES: &[&str] = &["amdhip64.dll"];
#[cfg(not(target_os = "windows"))]
const HIP_LIBRARIES: &[&str] = &["libamdhip64.so", "libamdhip64.so.6"];

/// Outcome of handing a command to a backend's native driver path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeDispatch {
    /// The driver accepted and executed the command
    Submitted,
    /// No native path; the command must run on the CPU executor
    Unsupported,
}

impl Backend {
    /// Every backend, hardware first
    pub const ALL: [Backend; 5] = [
        Backend::SpirvVulkan,
        Backend::SpirvOpenCl,
        Backend::Nvptx,
        Backend::Amdgcn,
        Backend::Software,
    ];

    /// Stable lowercase name (used in logs and configuration)
    pub fn name(&self) -> &'static str {
        match self {
            Backend::SpirvVulkan => "spirv_vulkan",
            Backend::SpirvOpenCl => "spirv_opencl",
            Backend::Nvptx => "nvptx",
            Backend::Amdgcn => "amdgcn",
            Backend::Software => "software",
        }
    }

    /// Parse a name produced by [`Backend::name`]
    pub fn from_name(name: &str) -> Option<Backend> {
        Self::ALL.into_iter().find(|backend| backend.name() == name)
    }

    /// Whether this backend runs on dedicated hardware
    pub fn is_hardware(&self) -> bool {
        !matches!(self, Backend::Software)
    }

    /// Shared libraries whose presence indicates the backend's driver
    pub fn driver_libraries(&self) -> &'static [&'static str] {
        match self {
            Backend::SpirvVulkan => VULKAN_LIBRARIES,
            Backend::SpirvOpenCl => OPENCL_LIBRARIES,
            Backend::Nvptx => CUDA_LIBRARIES,
            Backend::Amdgcn => HIP_LIBRARIES,
            Backend::Software => &[],
        }
    }

    /// Well-known driver entry point resolved by the availability probe
    pub fn driver_entry_point(&self) -> Option<&'static str> {
        match self {
            Backend::SpirvVulkan => Some("vkGetInstanceProcAddr"),
            Backend::SpirvOpenCl => Some("clGetPlatformIDs"),
            Backend::Nvptx => Some("cuInit"),
            Backend::Amdgcn => Some("hipInit"),
            Backend::Software => None,
        }
    }

    /// Cheap, side-effect-free availability probe
    ///
    /// Always `true` for `Software`. Hardware backends are available when one
    /// of their driver libraries loads and exports the driver entry point.
    pub fn is_available(&self) -> bool {
        match self.driver_entry_point() {
            None => true,
            Some(symbol) => dynamic_library::any_exposes_symbol(self.driver_libraries(), symbol),
        }
    }

    /// Resolve the backend a context should use, probing the real drivers
    pub fn resolve(preferred: Backend) -> Backend {
        Self::resolve_with(preferred, |backend| backend.is_available())
    }

    /// Resolve with a custom availability probe
    ///
    /// `preferred` wins if available; otherwise the first available entry of
    /// [`FALLBACK_PRIORITY`]; otherwise `Software`. `Software` is never probed.
    /// Never fails.
    pub fn resolve_with<P>(preferred: Backend, mut probe: P) -> Backend
    where
        P: FnMut(Backend) -> bool,
    {
        if preferred == Backend::Software || probe(preferred) {
            return preferred;
        }
        engine_warn!("galaxy3d::compute::Backend",
            "Preferred backend '{}' is not available, trying fallbacks", preferred);

        for candidate in FALLBACK_PRIORITY {
            if candidate == preferred {
                continue;
            }
            if probe(candidate) {
                engine_info!("galaxy3d::compute::Backend", "Falling back to backend '{}'", candidate);
                return candidate;
            }
            engine_debug!("galaxy3d::compute::Backend", "Backend '{}' is not available", candidate);
        }

        engine_info!("galaxy3d::compute::Backend", "No hardware backend available, using software");
        Backend::Software
    }

    /// Hand a command to the backend's native driver path
    ///
    /// Kernel code generation and driver submission are not implemented for
    /// any hardware backend yet, so every backend reports `Unsupported` and
    /// the caller routes the command to the CPU executor.
    pub fn dispatch_native(&self, command: &Command) -> NativeDispatch {
        if self.is_hardware() {
            crate::engine_trace!("galaxy3d::compute::Backend",
                "No native '{}' path for kernel '{}'", self, command.kernel().name());
        }
        NativeDispatch::Unsupported
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
