/*!
# Galaxy 3D Compute - Vulkan Backend

Vulkan device probe for the Galaxy 3D compute layer.

Registers a probe that creates a short-lived Vulkan instance (through Ash),
picks the best physical device with a compute queue and reports its
properties as a `DeviceInfo`.

Kernel submission through Vulkan compute queues is not implemented yet, so
dispatches on the `SpirvVulkan` backend still run on the CPU executor.
*/

mod vulkan_device_info;

pub use vulkan_device_info::{query_device_info, vendor_name};

// Main galaxy3d namespace module
pub mod galaxy3d {
    pub mod vulkan {
        pub use crate::register;
        pub use crate::vulkan_device_info::{query_device_info, vendor_name};
    }
}

use galaxy_3d_compute::galaxy3d::compute::{register_device_probe, Backend};

/// Register the Vulkan device probe with the compute layer
///
/// Contexts created afterwards on the `SpirvVulkan` backend report the real
/// device properties.
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_compute::galaxy3d::compute::{Config, Context};
///
/// galaxy_3d_compute_vulkan::register();
/// let ctx = Context::new(Config::default()).unwrap();
/// println!("{}", ctx.device_info());
/// ```
pub fn register() {
    register_device_probe(Backend::SpirvVulkan, query_device_info);
}
