/// Parallel software executor
///
/// Runs a kernel's CPU fallback once per invocation of a dispatch grid.
///
/// Work groups are numbered linearly (row-major, X fastest) and the range
/// `[0, total_groups)` is split into contiguous chunks, one per worker task.
/// Each task re-derives 3D group ids from its linear range and walks every
/// local invocation of each group. The calling thread blocks on a rayon scope
/// until every task has finished.
///
/// Small grids (at most `parallel_threshold` groups) and single-thread hosts
/// run on the calling thread.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use glam::UVec3;
use crate::compute::{CpuFallback, Invocation, Kernel, KernelArgs};
use crate::error::{Error, Result};
use crate::{engine_trace, engine_warn};

/// Hard upper bound on worker threads
pub const MAX_WORKER_THREADS: usize = 32;

/// Counters reported for one or more executed commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Fallback calls performed
    pub invocations: u64,
    /// Work groups executed
    pub workgroups: u64,
    /// Largest number of tasks a single command was split into
    pub threads_used: usize,
}

impl ExecutionStats {
    /// Fold `other` into `self`
    pub fn accumulate(&mut self, other: &ExecutionStats) {
        self.invocations += other.invocations;
        self.workgroups += other.workgroups;
        self.threads_used = self.threads_used.max(other.threads_used);
    }
}

/// Split `[0, total)` into at most `threads` contiguous, disjoint ranges
///
/// Every range holds `total / n` items and the first `total % n` ranges hold
/// one more, where `n = min(threads, total)`. Zero items gives no range.
pub fn partition(total: u64, threads: usize) -> Vec<Range<u64>> {
    if total == 0 {
        return Vec::new();
    }
    let count = (threads.max(1) as u64).min(total);
    let base = total / count;
    let remainder = total % count;

    let mut ranges = Vec::with_capacity(count as usize);
    let mut start = 0;
    for i in 0..count {
        let len = base + u64::from(i < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// 3D id of linear work group `linear` in a grid of `work_groups`
pub fn group_id(linear: u64, work_groups: UVec3) -> UVec3 {
    let gx = u64::from(work_groups.x);
    let plane = gx * u64::from(work_groups.y);
    let z = linear / plane;
    let in_plane = linear % plane;
    UVec3::new((in_plane % gx) as u32, (in_plane / gx) as u32, z as u32)
}

/// Number of work groups in a dispatch of `work_groups` groups of `workgroup_size`
///
/// # Errors
///
/// `Error::InvalidDispatch` if the group count or the invocation count
/// overflows `u64`, or if the global size on some axis does not fit in a `u32`.
pub fn checked_group_count(work_groups: UVec3, workgroup_size: UVec3) -> Result<u64> {
    let groups = work_groups.as_u64vec3();
    let size = workgroup_size.as_u64vec3();

    for (axis, count, width) in [("x", groups.x, size.x), ("y", groups.y, size.y), ("z", groups.z, size.z)] {
        if count * width > u64::from(u32::MAX) {
            return Err(Error::InvalidDispatch(format!(
                "{} groups of {} invocations overflow the 32-bit global size on {}", count, width, axis
            )));
        }
    }

    let total = groups.x
        .checked_mul(groups.y)
        .and_then(|xy| xy.checked_mul(groups.z));
    let invocations = total.and_then(|t| t.checked_mul(size.x * size.y).and_then(|v| v.checked_mul(size.z)));
    match (total, invocations) {
        (Some(total), Some(_)) => Ok(total),
        _ => Err(Error::InvalidDispatch(format!(
            "grid {} x workgroup {} has more than {} invocations", work_groups, workgroup_size, u64::MAX
        ))),
    }
}

/// Multi-threaded CPU executor
pub struct Executor {
    pool: Option<rayon::ThreadPool>,
    worker_threads: usize,
    parallel_threshold: u64,
}

impl Executor {
    /// Create an executor with at most `max_worker_threads` workers
    ///
    /// The worker count is `min(available CPUs, max_worker_threads, 32)`. If
    /// the rayon pool cannot be built, a warning is logged and every command
    /// runs on the calling thread.
    pub fn new(max_worker_threads: usize, parallel_threshold: u64) -> Self {
        let worker_threads = num_cpus::get()
            .min(max_worker_threads)
            .clamp(1, MAX_WORKER_THREADS);

        let pool = if worker_threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(worker_threads)
                .thread_name(|index| format!("galaxy3d-compute-{}", index))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    engine_warn!("galaxy3d::compute::Executor",
                        "Worker pool unavailable ({}), running kernels on the calling thread", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            pool,
            worker_threads,
            parallel_threshold,
        }
    }

    /// Number of worker threads the executor may fan out to
    pub fn worker_threads(&self) -> usize {
        if self.pool.is_some() { self.worker_threads } else { 1 }
    }

    pub fn parallel_threshold(&self) -> u64 {
        self.parallel_threshold
    }

    /// Whether commands above the threshold are split across workers
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Execute `kernel` over `work_groups`, blocking until every invocation ran
    ///
    /// Invocation order is unspecified. When a fallback fails, the remaining
    /// work groups are skipped and the first error is returned.
    ///
    /// # Errors
    ///
    /// - `Error::NoCpuFallback` if the kernel has no CPU implementation
    /// - `Error::InvalidDispatch` if the grid cannot be addressed (see `checked_group_count`)
    /// - any error returned by the fallback
    pub fn execute(&self, kernel: &Kernel, work_groups: UVec3, args: &KernelArgs) -> Result<ExecutionStats> {
        let fallback = kernel
            .cpu_fallback()
            .ok_or_else(|| Error::NoCpuFallback(kernel.name().to_string()))?;

        let total = checked_group_count(work_groups, kernel.workgroup_size())?;
        if total == 0 {
            return Ok(ExecutionStats::default());
        }

        let grid = Grid {
            fallback,
            workgroup_size: kernel.workgroup_size(),
            work_groups,
            args,
        };

        let threads_used = match &self.pool {
            Some(pool) if total > self.parallel_threshold => {
                let ranges = partition(total, self.worker_threads);
                let threads_used = ranges.len();
                let failed = AtomicBool::new(false);
                let first_error: Mutex<Option<Error>> = Mutex::new(None);

                pool.scope(|scope| {
                    for range in ranges {
                        let grid = &grid;
                        let failed = &failed;
                        let first_error = &first_error;
                        scope.spawn(move |_| {
                            if let Err(e) = grid.run(range, failed) {
                                failed.store(true, Ordering::Relaxed);
                                if let Ok(mut slot) = first_error.lock() {
                                    slot.get_or_insert(e);
                                }
                            }
                        });
                    }
                });

                let first_error = first_error
                    .into_inner()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Some(e) = first_error {
                    return Err(e);
                }
                threads_used
            }
            _ => {
                grid.run(0..total, &AtomicBool::new(false))?;
                1
            }
        };

        engine_trace!("galaxy3d::compute::Executor",
            "Kernel '{}': {} groups on {} thread(s)", kernel.name(), total, threads_used);

        Ok(ExecutionStats {
            invocations: total * kernel.invocations_per_group(),
            workgroups: total,
            threads_used,
        })
    }
}

/// Everything a worker task needs to replay part of a dispatch
struct Grid<'a> {
    fallback: &'a CpuFallback,
    workgroup_size: UVec3,
    work_groups: UVec3,
    args: &'a KernelArgs,
}

impl Grid<'_> {
    fn run(&self, range: Range<u64>, failed: &AtomicBool) -> Result<()> {
        let size = self.workgroup_size;
        for linear in range {
            if failed.load(Ordering::Relaxed) {
                break;
            }
            let group = group_id(linear, self.work_groups);
            for z in 0..size.z {
                for y in 0..size.y {
                    for x in 0..size.x {
                        let local = UVec3::new(x, y, z);
                        let invocation = Invocation {
                            global_id: group * size + local,
                            local_id: local,
                            group_id: group,
                            workgroup_size: size,
                            work_groups: self.work_groups,
                        };
                        (self.fallback)(&invocation, self.args)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
