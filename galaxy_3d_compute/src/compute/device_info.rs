/// Device metadata and the device probe plugin registry
///
/// Backend crates register a probe that queries real device properties
/// (e.g. the Vulkan plugin). Without a registered probe, or when the probe
/// fails, a descriptive default is produced. Probing never fails a context.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use rustc_hash::FxHashMap;
use crate::compute::{Backend, Config};
use crate::error::Result;
use crate::{engine_debug, engine_warn};

/// Read-only description of the device behind a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend the device is driven by
    pub backend: Backend,
    /// Device name
    pub name: String,
    /// Vendor name
    pub vendor: String,
    /// Compute units (SMs, CUs, CPU cores)
    pub compute_units: u32,
    /// Device memory in bytes
    pub global_memory: u64,
    /// Workgroup shared memory in bytes
    pub local_memory: u64,
    /// Maximum invocations in a single workgroup
    pub max_workgroup_invocations: u32,
    pub supports_fp16: bool,
    pub supports_fp64: bool,
}

impl DeviceInfo {
    /// Description used when no probe is registered for `backend`
    pub fn fallback(backend: Backend, config: &Config) -> Self {
        match backend {
            Backend::Software => Self {
                backend,
                name: "Galaxy3D software executor".to_string(),
                vendor: "CPU".to_string(),
                compute_units: num_cpus::get() as u32,
                global_memory: config.max_pool_size,
                local_memory: 32 * 1024,
                max_workgroup_invocations: 1024,
                supports_fp16: false,
                supports_fp64: true,
            },
            _ => Self {
                backend,
                name: format!("{} device", backend),
                vendor: "unknown".to_string(),
                compute_units: 0,
                global_memory: 0,
                local_memory: 0,
                max_workgroup_invocations: 0,
                supports_fp16: false,
                supports_fp64: false,
            },
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} compute units, {} MiB) via {}",
            self.name,
            self.vendor,
            self.compute_units,
            self.global_memory / (1024 * 1024),
            self.backend)
    }
}

// ============================================================================
// Device probe registry
// ============================================================================

/// Device probe function type
type DeviceProbe = Arc<dyn Fn(&Config) -> Result<DeviceInfo> + Send + Sync>;

static DEVICE_PROBES: Mutex<Option<FxHashMap<Backend, DeviceProbe>>> = Mutex::new(None);

/// Register the device probe for `backend`, replacing any previous one
///
/// # Arguments
///
/// * `backend` - Backend the probe describes
/// * `probe` - Function querying the device properties
pub fn register_device_probe<F>(backend: Backend, probe: F)
where
    F: Fn(&Config) -> Result<DeviceInfo> + Send + Sync + 'static,
{
    let mut probes = DEVICE_PROBES.lock().unwrap_or_else(PoisonError::into_inner);
    probes
        .get_or_insert_with(FxHashMap::default)
        .insert(backend, Arc::new(probe));
    engine_debug!("galaxy3d::compute::DeviceInfo", "Registered device probe for '{}'", backend);
}

/// Remove the device probe for `backend`, returning whether one was registered
pub fn unregister_device_probe(backend: Backend) -> bool {
    let mut probes = DEVICE_PROBES.lock().unwrap_or_else(PoisonError::into_inner);
    probes
        .as_mut()
        .map(|map| map.remove(&backend).is_some())
        .unwrap_or(false)
}

/// Whether a device probe is registered for `backend`
pub fn has_device_probe(backend: Backend) -> bool {
    device_probe(backend).is_some()
}

fn device_probe(backend: Backend) -> Option<DeviceProbe> {
    let probes = DEVICE_PROBES.lock().unwrap_or_else(PoisonError::into_inner);
    probes.as_ref()?.get(&backend).cloned()
}

/// Describe the device behind `backend`
///
/// Runs the registered probe if any. A failing probe is logged and replaced
/// by [`DeviceInfo::fallback`].
pub fn query_device_info(backend: Backend, config: &Config) -> DeviceInfo {
    let Some(probe) = device_probe(backend) else {
        return DeviceInfo::fallback(backend, config);
    };
    match probe(config) {
        Ok(info) => info,
        Err(e) => {
            engine_warn!("galaxy3d::compute::DeviceInfo",
                "Device probe for '{}' failed: {}", backend, e);
            DeviceInfo::fallback(backend, config)
        }
    }
}

#[cfg(test)]
#[path = "device_info_tests.rs"]
mod tests;
