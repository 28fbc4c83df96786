use super::*;
use serial_test::serial;
use crate::error::Error;

fn fake_device(backend: Backend) -> DeviceInfo {
    DeviceInfo {
        backend,
        name: "Fake GPU".to_string(),
        vendor: "Galaxy".to_string(),
        compute_units: 40,
        global_memory: 8 * 1024 * 1024 * 1024,
        local_memory: 64 * 1024,
        max_workgroup_invocations: 1024,
        supports_fp16: true,
        supports_fp64: false,
    }
}

// ============================================================================
// Fallback description tests
// ============================================================================

#[test]
fn test_software_fallback_describes_cpu() {
    let config = Config::software().with_max_pool_size(1024);
    let info = DeviceInfo::fallback(Backend::Software, &config);

    assert_eq!(info.backend, Backend::Software);
    assert_eq!(info.vendor, "CPU");
    assert!(info.compute_units >= 1);
    assert_eq!(info.global_memory, 1024);
    assert!(info.max_workgroup_invocations > 0);
}

#[test]
fn test_hardware_fallback_is_descriptive() {
    let info = DeviceInfo::fallback(Backend::Amdgcn, &Config::default());
    assert_eq!(info.name, "amdgcn device");
    assert_eq!(info.vendor, "unknown");
}

#[test]
fn test_display() {
    let text = format!("{}", fake_device(Backend::Nvptx));
    assert_eq!(text, "Fake GPU (Galaxy, 40 compute units, 8192 MiB) via nvptx");
}

// ============================================================================
// Registry tests
// ============================================================================

#[test]
#[serial]
fn test_registered_probe_is_used() {
    register_device_probe(Backend::Nvptx, |_| Ok(fake_device(Backend::Nvptx)));
    assert!(has_device_probe(Backend::Nvptx));

    let info = query_device_info(Backend::Nvptx, &Config::default());
    assert_eq!(info, fake_device(Backend::Nvptx));

    assert!(unregister_device_probe(Backend::Nvptx));
    assert!(!has_device_probe(Backend::Nvptx));
}

#[test]
#[serial]
fn test_failing_probe_falls_back() {
    register_device_probe(Backend::SpirvOpenCl, |_| {
        Err(Error::InitializationFailed("no platform".to_string()))
    });

    let info = query_device_info(Backend::SpirvOpenCl, &Config::default());
    assert_eq!(info, DeviceInfo::fallback(Backend::SpirvOpenCl, &Config::default()));

    unregister_device_probe(Backend::SpirvOpenCl);
}

#[test]
#[serial]
fn test_probe_receives_config() {
    register_device_probe(Backend::Amdgcn, |config| {
        let mut info = fake_device(Backend::Amdgcn);
        info.name = config.app_name.clone();
        Ok(info)
    });

    let info = query_device_info(Backend::Amdgcn, &Config::default().with_app_name("probe-me"));
    assert_eq!(info.name, "probe-me");

    unregister_device_probe(Backend::Amdgcn);
}

#[test]
#[serial]
fn test_unregister_unknown_probe() {
    assert!(!unregister_device_probe(Backend::Software));
}
