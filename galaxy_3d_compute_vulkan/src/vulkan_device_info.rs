/// Vulkan physical device query
///
/// Creates a bare instance (no surface, no layers), ranks the physical
/// devices exposing a compute queue and describes the best one.

use ash::vk;
use std::ffi::CString;
use galaxy_3d_compute::galaxy3d::{Error, Result};
use galaxy_3d_compute::galaxy3d::compute::{Backend, Config, DeviceInfo};
use galaxy_3d_compute::{engine_debug, engine_error};

/// Describe the best Vulkan compute device on this host
///
/// # Errors
///
/// `Error::InitializationFailed` if the loader, the instance or a compute
/// capable device is missing.
pub fn query_device_info(config: &Config) -> Result<DeviceInfo> {
    unsafe {
        let entry = ash::Entry::load()
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

        let app_name = CString::new(config.app_name.as_str())
            .map_err(|e| Error::InitializationFailed(format!("Invalid app name: {}", e)))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"Galaxy3D")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_1);

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info);

        let instance = entry
            .create_instance(&create_info, None)
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

        let info = describe_best_device(&instance);
        instance.destroy_instance(None);
        info
    }
}

unsafe fn describe_best_device(instance: &ash::Instance) -> Result<DeviceInfo> {
    let physical_devices = instance
        .enumerate_physical_devices()
        .map_err(|e| Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e)))?;

    let (physical_device, properties) = physical_devices
        .into_iter()
        .filter(|&device| has_compute_queue(instance, device))
        .map(|device| (device, instance.get_physical_device_properties(device)))
        .max_by_key(|(_, properties)| device_type_rank(properties.device_type))
        .ok_or_else(|| Error::InitializationFailed("No Vulkan device with a compute queue found".to_string()))?;

    let memory = instance.get_physical_device_memory_properties(physical_device);
    let features = instance.get_physical_device_features(physical_device);
    let limits = properties.limits;

    let global_memory = memory.memory_heaps[..memory.memory_heap_count as usize]
        .iter()
        .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
        .map(|heap| heap.size)
        .max()
        .unwrap_or(0);

    let name = properties
        .device_name_as_c_str()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "Unknown Vulkan device".to_string());

    engine_debug!("galaxy3d::vulkan", "Selected compute device '{}' ({:?})", name, properties.device_type);

    Ok(DeviceInfo {
        backend: Backend::SpirvVulkan,
        name,
        vendor: vendor_name(properties.vendor_id),
        // Core Vulkan does not report SM/CU counts
        compute_units: 0,
        global_memory,
        local_memory: u64::from(limits.max_compute_shared_memory_size),
        max_workgroup_invocations: limits.max_compute_work_group_invocations,
        supports_fp16: supports_float16(instance, physical_device, properties.api_version),
        supports_fp64: features.shader_float64 == vk::TRUE,
    })
}

unsafe fn has_compute_queue(instance: &ash::Instance, device: vk::PhysicalDevice) -> bool {
    instance
        .get_physical_device_queue_family_properties(device)
        .iter()
        .any(|family| family.queue_flags.contains(vk::QueueFlags::COMPUTE))
}

unsafe fn supports_float16(instance: &ash::Instance, device: vk::PhysicalDevice, api_version: u32) -> bool {
    if api_version < vk::API_VERSION_1_1 {
        return false;
    }
    let mut float16 = vk::PhysicalDeviceShaderFloat16Int8Features::default();
    {
        let mut features2 = vk::PhysicalDeviceFeatures2::default().push_next(&mut float16);
        instance.get_physical_device_features2(device, &mut features2);
    }
    float16.shader_float16 == vk::TRUE
}

/// Discrete GPUs first, then integrated, virtual, CPU
fn device_type_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 4,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 3,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 1,
        _ => 0,
    }
}

/// Human-readable name of a PCI vendor id
pub fn vendor_name(vendor_id: u32) -> String {
    match vendor_id {
        0x1002 => "AMD".to_string(),
        0x10DE => "NVIDIA".to_string(),
        0x8086 => "Intel".to_string(),
        0x13B5 => "ARM".to_string(),
        0x5143 => "Qualcomm".to_string(),
        0x106B => "Apple".to_string(),
        0x1010 => "ImgTec".to_string(),
        0x10005 => "Mesa".to_string(),
        other => format!("0x{:04X}", other),
    }
}

#[cfg(test)]
#[path = "vulkan_device_info_tests.rs"]
mod tests;
