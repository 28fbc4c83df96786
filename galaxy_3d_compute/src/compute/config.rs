/// Compute context configuration

use crate::compute::{Backend, MAX_WORKER_THREADS};

/// Default pool budget: 256 MiB
pub const DEFAULT_MAX_POOL_SIZE: u64 = 256 * 1024 * 1024;

/// Work-group count at or below which commands run on the calling thread
pub const DEFAULT_PARALLEL_THRESHOLD: u64 = 4;

/// Context configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend to use when its driver is present
    pub preferred_backend: Backend,
    /// Skip hardware probing and run everything on the software executor
    pub force_software: bool,
    /// Buffer pool budget in bytes
    pub max_pool_size: u64,
    /// Upper bound on executor worker threads (never more than 32)
    pub max_worker_threads: usize,
    /// Commands with at most this many work groups are not split across workers
    pub parallel_threshold: u64,
    /// Application name (logs, driver instance info)
    pub app_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_backend: Backend::SpirvVulkan,
            force_software: false,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            max_worker_threads: MAX_WORKER_THREADS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            app_name: "Galaxy3D Compute".to_string(),
        }
    }
}

impl Config {
    /// Software-only configuration
    pub fn software() -> Self {
        Self::default().with_force_software(true)
    }

    pub fn with_preferred_backend(mut self, backend: Backend) -> Self {
        self.preferred_backend = backend;
        self
    }

    pub fn with_force_software(mut self, force: bool) -> Self {
        self.force_software = force;
        self
    }

    pub fn with_max_pool_size(mut self, bytes: u64) -> Self {
        self.max_pool_size = bytes;
        self
    }

    /// Set the worker thread bound, clamped to `1..=32`
    pub fn with_max_worker_threads(mut self, threads: usize) -> Self {
        self.max_worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    pub fn with_parallel_threshold(mut self, groups: u64) -> Self {
        self.parallel_threshold = groups;
        self
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
