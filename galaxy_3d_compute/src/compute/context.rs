/// Compute context: the public facade
///
/// Owns the resolved backend, the device description, the buffer pool, the
/// command queue and the software executor.
///
/// Typical flow: create buffers, upload inputs, dispatch kernels, `sync`,
/// download results. Everything is synchronous; `sync` is the only call that
/// blocks on kernel execution.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use bytemuck::Pod;
use glam::UVec3;
use crate::compute::{
    query_device_info, Backend, BufferHandle, BufferPool, BufferUsage, Command,
    CommandQueue, Config, DeviceInfo, ExecutionStats, Executor, Kernel,
    KernelArgs, NativeDispatch,
};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "galaxy3d::compute::Context";

/// Compute context
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_compute::galaxy3d::compute::{Access, BufferUsage, Config, Context, KernelBuilder};
///
/// # fn main() -> galaxy_3d_compute::galaxy3d::Result<()> {
/// let mut ctx = Context::new(Config::default())?;
/// let output = ctx.create_buffer(64 * 4, BufferUsage::STORAGE)?;
///
/// let kernel = KernelBuilder::new("square")
///     .workgroup_size([64, 1, 1])
///     .bind(0, output, Access::WriteOnly)
///     .cpu_fallback(|inv, args| {
///         let x = inv.global_id.x;
///         args.write_pod::<u32>(0, x as usize, x * x)
///     })
///     .build()?;
///
/// ctx.dispatch(&kernel, [1, 1, 1]);
/// ctx.sync()?;
///
/// let mut squares = [0u32; 64];
/// ctx.download_pod(output, &mut squares)?;
/// # Ok(())
/// # }
/// ```
pub struct Context {
    config: Config,
    backend: Backend,
    device_info: DeviceInfo,
    pool: BufferPool,
    queue: CommandQueue,
    executor: Executor,
    stats: ExecutionStats,
}

impl Context {
    /// Create a context, probing for the best available backend
    ///
    /// The preferred backend is used when its driver is present; otherwise
    /// the fallback cascade picks the first available hardware backend, and
    /// finally the software executor. Probing happens once, here.
    pub fn new(config: Config) -> Result<Self> {
        let backend = if config.force_software {
            engine_debug!(SOURCE, "Software execution forced, skipping backend probes");
            Backend::Software
        } else {
            Backend::resolve(config.preferred_backend)
        };
        Self::with_backend(config, backend)
    }

    /// Create a context on `backend` without probing for availability
    pub fn with_backend(config: Config, backend: Backend) -> Result<Self> {
        if config.max_worker_threads == 0 {
            return Err(Error::InitializationFailed(
                "max_worker_threads must be at least 1".to_string(),
            ));
        }

        let device_info = query_device_info(backend, &config);
        let executor = Executor::new(config.max_worker_threads, config.parallel_threshold);

        engine_info!(SOURCE, "Compute context '{}' created: {}", config.app_name, device_info);
        engine_debug!(SOURCE, "Pool budget {} bytes, {} worker thread(s)",
            config.max_pool_size, executor.worker_threads());

        Ok(Self {
            pool: BufferPool::new(config.max_pool_size),
            queue: CommandQueue::new(),
            config,
            backend,
            device_info,
            executor,
            stats: ExecutionStats::default(),
        })
    }

    // ===== BUFFERS =====

    /// Allocate a zero-initialized buffer of `size` bytes
    pub fn create_buffer(&mut self, size: u64, usage: BufferUsage) -> Result<BufferHandle> {
        let handle = self.pool.allocate(size, usage)?;
        engine_trace!(SOURCE, "Created buffer {} ({} bytes)", handle, size);
        Ok(handle)
    }

    /// Copy `data` to the start of the buffer
    pub fn upload_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> Result<()> {
        self.pool
            .get_mut(handle)
            .ok_or(Error::InvalidHandle(handle))?
            .upload(data)
    }

    /// Copy the start of the buffer into `out`, returning the bytes copied
    pub fn download_buffer(&self, handle: BufferHandle, out: &mut [u8]) -> Result<usize> {
        Ok(self.pool
            .get(handle)
            .ok_or(Error::InvalidHandle(handle))?
            .download(out))
    }

    /// Upload a slice of plain-old-data values
    pub fn upload_pod<T: Pod>(&mut self, handle: BufferHandle, values: &[T]) -> Result<()> {
        self.upload_buffer(handle, bytemuck::cast_slice(values))
    }

    /// Download into a slice of plain-old-data values, returning the bytes copied
    pub fn download_pod<T: Pod>(&self, handle: BufferHandle, out: &mut [T]) -> Result<usize> {
        self.download_buffer(handle, bytemuck::cast_slice_mut(out))
    }

    /// Release a buffer; its handle (and every copy of it) becomes invalid
    pub fn destroy_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        if !self.pool.free(handle) {
            return Err(Error::InvalidHandle(handle));
        }
        engine_trace!(SOURCE, "Destroyed buffer {}", handle);
        Ok(())
    }

    pub fn buffer_size(&self, handle: BufferHandle) -> Result<u64> {
        self.pool
            .get(handle)
            .map(|buffer| buffer.size())
            .ok_or(Error::InvalidHandle(handle))
    }

    pub fn buffer_usage(&self, handle: BufferHandle) -> Result<BufferUsage> {
        self.pool
            .get(handle)
            .map(|buffer| buffer.usage())
            .ok_or(Error::InvalidHandle(handle))
    }

    /// The buffer pool (read-only)
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    // ===== DISPATCH =====

    /// Record a dispatch of `kernel` over `work_groups`; runs on the next `sync`
    pub fn dispatch(&mut self, kernel: &Kernel, work_groups: impl Into<UVec3>) {
        let command = Command::new(kernel.clone(), work_groups);
        engine_trace!(SOURCE, "Queued kernel '{}' over {} groups",
            kernel.name(), command.work_groups());
        self.queue.submit(command);
    }

    /// Execute every pending command in submission order
    ///
    /// On error the completed commands are gone and the failing command stays
    /// at the front of the queue along with everything after it.
    pub fn sync(&mut self) -> Result<()> {
        let Self { backend, pool, queue, executor, stats, .. } = self;
        let executed = queue.flush(|command| {
            run_command(*backend, pool, executor, stats, command)
        })?;
        if executed > 0 {
            engine_trace!(SOURCE, "Synchronized {} command(s)", executed);
        }
        Ok(())
    }

    /// Run `kernel` right away on the CPU executor, bypassing the queue
    ///
    /// Pending commands are not flushed first.
    ///
    /// # Errors
    ///
    /// `Error::NoCpuFallback` if the kernel has no CPU implementation.
    pub fn execute_cpu(&mut self, kernel: &Kernel, work_groups: impl Into<UVec3>) -> Result<ExecutionStats> {
        if !kernel.has_cpu_fallback() {
            return Err(Error::NoCpuFallback(kernel.name().to_string()));
        }
        let command_stats = run_on_cpu(&mut self.pool, &self.executor, kernel, work_groups.into())?;
        self.stats.accumulate(&command_stats);
        Ok(command_stats)
    }

    /// Number of commands waiting for `sync`
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drop every pending command without running it
    pub fn discard_pending(&mut self) {
        if !self.queue.is_empty() {
            engine_debug!(SOURCE, "Discarding {} pending command(s)", self.queue.len());
        }
        self.queue.clear();
    }

    // ===== INFO =====

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Whether the resolved backend is anything other than software
    pub fn is_hardware_accelerated(&self) -> bool {
        self.backend.is_hardware()
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Executor counters accumulated over the context's lifetime
    pub fn stats(&self) -> ExecutionStats {
        self.stats
    }

    /// Worker threads available to the software executor
    pub fn worker_threads(&self) -> usize {
        self.executor.worker_threads()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if !self.queue.is_empty() {
            engine_warn!(SOURCE, "Dropping {} unsynchronized command(s)", self.queue.len());
        }
        engine_info!(SOURCE, "Compute context '{}' destroyed ({} live buffer(s), {} invocation(s) executed)",
            self.config.app_name, self.pool.live_count(), self.stats.invocations);
    }
}

// ===== COMMAND EXECUTION =====

fn run_command(
    backend: Backend,
    pool: &mut BufferPool,
    executor: &Executor,
    stats: &mut ExecutionStats,
    command: &Command,
) -> Result<()> {
    if backend.dispatch_native(command) == NativeDispatch::Submitted {
        return Ok(());
    }

    let kernel = command.kernel();
    if !kernel.has_cpu_fallback() {
        engine_warn!(SOURCE, "Kernel '{}' has no CPU fallback and '{}' cannot run it natively, dispatch skipped",
            kernel.name(), backend);
        return Ok(());
    }

    let command_stats = run_on_cpu(pool, executor, kernel, command.work_groups())?;
    stats.accumulate(&command_stats);
    Ok(())
}

/// Move the bound buffers out, run the fallback grid, put the buffers back
///
/// A panicking fallback is reported as `Error::KernelFailed`; the buffers
/// are restored before the error is returned.
fn run_on_cpu(
    pool: &mut BufferPool,
    executor: &Executor,
    kernel: &Kernel,
    work_groups: UVec3,
) -> Result<ExecutionStats> {
    let args = KernelArgs::bind(pool, kernel.bindings())?;
    let result = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(kernel, work_groups, &args)))
        .unwrap_or_else(|payload| {
            let message = format!("CPU fallback of kernel '{}' panicked: {}", kernel.name(), panic_message(&*payload));
            engine_error!(SOURCE, "{}", message);
            Err(Error::KernelFailed(message))
        });
    args.release(pool);
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
