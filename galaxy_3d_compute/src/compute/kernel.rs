/// Kernel description and kernel builder
///
/// A Kernel is an immutable description of a unit of compute work:
/// - name (diagnostics, device-side entry point)
/// - workgroup size: fixed 3D block of invocations
/// - bindings: buffer handles attached to numbered slots with an access mode
/// - optional CPU fallback, run by the software executor
///
/// Kernels are cheap to clone (shared) and can be dispatched any number of times.

use std::fmt;
use std::sync::Arc;
use glam::UVec3;
use rustc_hash::FxHashSet;
use crate::compute::{BufferHandle, KernelArgs};
use crate::error::{Error, Result};
use crate::engine_bail;

// ===== ACCESS MODE =====

/// How a kernel accesses a bound buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    /// Whether the kernel may read the buffer
    pub fn can_read(&self) -> bool {
        matches!(self, Access::ReadOnly | Access::ReadWrite)
    }

    /// Whether the kernel may write the buffer
    pub fn can_write(&self) -> bool {
        matches!(self, Access::WriteOnly | Access::ReadWrite)
    }

    /// Access covering both `self` and `other`
    pub fn union(self, other: Access) -> Access {
        if self == other {
            self
        } else {
            Access::ReadWrite
        }
    }
}

// ===== BINDING =====

/// Association of a buffer with a kernel binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub slot: u32,
    pub buffer: BufferHandle,
    pub access: Access,
}

// ===== INVOCATION =====

/// Identifiers of one kernel invocation, as seen by the CPU fallback
///
/// `global_id = group_id * workgroup_size + local_id` (component-wise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub global_id: UVec3,
    pub local_id: UVec3,
    pub group_id: UVec3,
    pub workgroup_size: UVec3,
    pub work_groups: UVec3,
}

impl Invocation {
    /// Total invocation grid size (work groups × workgroup size)
    pub fn global_size(&self) -> UVec3 {
        self.work_groups * self.workgroup_size
    }

    /// Row-major (X fastest) linear index of `global_id` in the invocation grid
    pub fn global_linear_index(&self) -> u64 {
        let size = self.global_size().as_u64vec3();
        let id = self.global_id.as_u64vec3();
        id.x + size.x * (id.y + size.y * id.z)
    }
}

// ===== CPU FALLBACK =====

/// CPU implementation of a kernel, called once per invocation
///
/// Must not spawn threads. Any state besides the bound buffers is captured by
/// the closure itself and must be safe to share between worker threads.
pub type CpuFallback = Arc<dyn Fn(&Invocation, &KernelArgs) -> Result<()> + Send + Sync>;

// ===== KERNEL =====

struct KernelInner {
    name: String,
    bindings: Vec<Binding>,
    workgroup_size: UVec3,
    cpu_fallback: Option<CpuFallback>,
}

/// Immutable, shareable compute kernel
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<KernelInner>,
}

impl Kernel {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.inner.bindings
    }

    pub fn workgroup_size(&self) -> UVec3 {
        self.inner.workgroup_size
    }

    /// Invocations per workgroup
    pub fn invocations_per_group(&self) -> u64 {
        let size = self.inner.workgroup_size.as_u64vec3();
        size.x.saturating_mul(size.y).saturating_mul(size.z)
    }

    pub fn cpu_fallback(&self) -> Option<&CpuFallback> {
        self.inner.cpu_fallback.as_ref()
    }

    pub fn has_cpu_fallback(&self) -> bool {
        self.inner.cpu_fallback.is_some()
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.inner.name)
            .field("bindings", &self.inner.bindings)
            .field("workgroup_size", &self.inner.workgroup_size)
            .field("cpu_fallback", &self.inner.cpu_fallback.is_some())
            .finish()
    }
}

// ===== KERNEL BUILDER =====

/// Builder for [`Kernel`]
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_compute::galaxy3d::compute::{Access, BufferHandle, KernelBuilder};
///
/// # fn build(output: BufferHandle) -> galaxy_3d_compute::galaxy3d::Result<()> {
/// let kernel = KernelBuilder::new("fill_index")
///     .workgroup_size([64, 1, 1])
///     .bind(0, output, Access::WriteOnly)
///     .cpu_fallback(|inv, args| {
///         let i = inv.global_id.x as usize;
///         args.write_pod::<u32>(0, i, inv.global_id.x)
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct KernelBuilder {
    name: String,
    bindings: Vec<Binding>,
    workgroup_size: UVec3,
    cpu_fallback: Option<CpuFallback>,
}

impl KernelBuilder {
    /// Start a kernel with a 1×1×1 workgroup and no bindings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
            workgroup_size: UVec3::ONE,
            cpu_fallback: None,
        }
    }

    /// Set the fixed workgroup size
    pub fn workgroup_size(mut self, size: impl Into<UVec3>) -> Self {
        self.workgroup_size = size.into();
        self
    }

    /// Bind `buffer` to `slot` with the given access mode
    pub fn bind(mut self, slot: u32, buffer: BufferHandle, access: Access) -> Self {
        self.bindings.push(Binding { slot, buffer, access });
        self
    }

    /// Attach a CPU implementation
    pub fn cpu_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&Invocation, &KernelArgs) -> Result<()> + Send + Sync + 'static,
    {
        self.cpu_fallback = Some(Arc::new(fallback));
        self
    }

    /// Validate and freeze the kernel
    ///
    /// # Errors
    ///
    /// - a workgroup size component is zero
    /// - two bindings share a slot (`Error::InvalidBinding`)
    pub fn build(self) -> Result<Kernel> {
        if self.workgroup_size.cmpeq(UVec3::ZERO).any() {
            engine_bail!("galaxy3d::compute::Kernel",
                "Kernel '{}': workgroup size {} has a zero component",
                self.name, self.workgroup_size);
        }

        let mut slots = FxHashSet::default();
        for binding in &self.bindings {
            if !slots.insert(binding.slot) {
                return Err(Error::InvalidBinding(format!(
                    "kernel '{}' binds slot {} more than once",
                    self.name, binding.slot
                )));
            }
        }

        Ok(Kernel {
            inner: Arc::new(KernelInner {
                name: self.name,
                bindings: self.bindings,
                workgroup_size: self.workgroup_size,
                cpu_fallback: self.cpu_fallback,
            }),
        })
    }
}

#[cfg(test)]
#[path = "kernel_tests.rs"]
mod tests;
