/// Buffer views handed to CPU kernel fallbacks
///
/// While a command runs on the software executor, the contents of every
/// buffer it binds are moved out of their pool slot into a `RwLock`, so the
/// fallback can be called concurrently from worker threads without touching
/// the pool. Access modes declared on the kernel are enforced here: reading a
/// write-only slot or writing a read-only slot is an `InvalidBinding` error.
///
/// A buffer bound to several slots is moved once and its access modes are
/// merged. The contents go back to the pool when the command completes,
/// whether it succeeded, failed or panicked.
///
/// Throughput: the lock covers the whole buffer. Reads of read-only slots run
/// in parallel, but every `write`/`write_pod` takes the buffer exclusively, so
/// workers writing the same output buffer take turns. Fallbacks that produce
/// many values per invocation should compute them first and store them with a
/// single `write` call.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use bytemuck::Pod;
use rustc_hash::FxHashMap;
use crate::compute::{Access, Binding, BufferHandle, BufferPool};
use crate::error::{Error, Result};

struct BoundBuffer {
    handle: BufferHandle,
    access: Access,
    data: RwLock<Vec<u8>>,
}

#[derive(Debug, Clone, Copy)]
struct SlotView {
    buffer: usize,
    access: Access,
}

/// Bound buffers of one command, indexed by binding slot
pub struct KernelArgs {
    buffers: Vec<BoundBuffer>,
    slots: FxHashMap<u32, SlotView>,
}

impl KernelArgs {
    /// Arguments with no bound buffer
    pub fn empty() -> Self {
        Self {
            buffers: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    /// Move the contents of every bound buffer out of `pool`
    ///
    /// Every handle is validated before anything is moved, so on error the
    /// pool is left untouched.
    ///
    /// # Errors
    ///
    /// `Error::InvalidHandle` if a binding names a stale handle.
    pub(crate) fn bind(pool: &mut BufferPool, bindings: &[Binding]) -> Result<Self> {
        if let Some(stale) = bindings.iter().find(|binding| !pool.contains(binding.buffer)) {
            return Err(Error::InvalidHandle(stale.buffer));
        }

        let mut args = Self::empty();
        let mut by_handle: FxHashMap<BufferHandle, usize> = FxHashMap::default();

        for binding in bindings {
            let buffer = match by_handle.get(&binding.buffer).copied() {
                Some(existing) => {
                    let bound = &mut args.buffers[existing];
                    bound.access = bound.access.union(binding.access);
                    existing
                }
                None => {
                    let data = match pool.get_mut(binding.buffer) {
                        Some(buffer) => buffer.take_data(),
                        None => {
                            args.release(pool);
                            return Err(Error::InvalidHandle(binding.buffer));
                        }
                    };
                    args.buffers.push(BoundBuffer {
                        handle: binding.buffer,
                        access: binding.access,
                        data: RwLock::new(data),
                    });
                    by_handle.insert(binding.buffer, args.buffers.len() - 1);
                    args.buffers.len() - 1
                }
            };
            args.slots.insert(binding.slot, SlotView { buffer, access: binding.access });
        }

        Ok(args)
    }

    /// Give every moved buffer back to `pool`
    pub(crate) fn release(self, pool: &mut BufferPool) {
        for bound in self.buffers {
            let data = bound.data
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(buffer) = pool.get_mut(bound.handle) {
                buffer.restore_data(data);
            }
        }
    }

    /// Number of distinct buffers bound
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Handle bound to `slot`
    pub fn handle(&self, slot: u32) -> Option<BufferHandle> {
        self.slots.get(&slot).map(|view| self.buffers[view.buffer].handle)
    }

    /// Access mode declared for `slot`
    pub fn access(&self, slot: u32) -> Option<Access> {
        self.slots.get(&slot).map(|view| view.access)
    }

    /// Merged access mode of the buffer behind `slot`
    pub fn buffer_access(&self, slot: u32) -> Option<Access> {
        self.slots.get(&slot).map(|view| self.buffers[view.buffer].access)
    }

    /// Size in bytes of the buffer bound to `slot`
    pub fn byte_len(&self, slot: u32) -> Result<usize> {
        let view = self.view(slot)?;
        Ok(self.lock_read(view)?.len())
    }

    /// Run `f` over the contents of a readable slot
    pub fn read<R>(&self, slot: u32, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let view = self.readable(slot)?;
        let guard = self.lock_read(view)?;
        Ok(f(&guard))
    }

    /// Run `f` over the contents of a writable slot
    pub fn write<R>(&self, slot: u32, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        let view = self.writable(slot)?;
        let mut guard = self.lock_write(view)?;
        Ok(f(&mut guard))
    }

    /// Read element `index` of a readable slot viewed as an array of `T`
    ///
    /// # Errors
    ///
    /// `Error::BufferTooSmall` if the element lies past the end of the buffer.
    pub fn read_pod<T: Pod>(&self, slot: u32, index: usize) -> Result<T> {
        let view = self.readable(slot)?;
        let guard = self.lock_read(view)?;
        let range = element_range::<T>(index, guard.len())?;
        Ok(bytemuck::pod_read_unaligned(&guard[range]))
    }

    /// Write element `index` of a writable slot viewed as an array of `T`
    pub fn write_pod<T: Pod>(&self, slot: u32, index: usize, value: T) -> Result<()> {
        let view = self.writable(slot)?;
        let mut guard = self.lock_write(view)?;
        let range = element_range::<T>(index, guard.len())?;
        guard[range].copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    // ===== INTERNAL =====

    fn view(&self, slot: u32) -> Result<SlotView> {
        self.slots
            .get(&slot)
            .copied()
            .ok_or_else(|| Error::InvalidBinding(format!("slot {} is not bound", slot)))
    }

    fn readable(&self, slot: u32) -> Result<SlotView> {
        let view = self.view(slot)?;
        if !view.access.can_read() {
            return Err(Error::InvalidBinding(format!(
                "slot {} is bound {:?} and cannot be read", slot, view.access
            )));
        }
        Ok(view)
    }

    fn writable(&self, slot: u32) -> Result<SlotView> {
        let view = self.view(slot)?;
        if !view.access.can_write() {
            return Err(Error::InvalidBinding(format!(
                "slot {} is bound {:?} and cannot be written", slot, view.access
            )));
        }
        Ok(view)
    }

    fn lock_read(&self, view: SlotView) -> Result<RwLockReadGuard<'_, Vec<u8>>> {
        let bound = &self.buffers[view.buffer];
        bound.data.read().map_err(|_| {
            Error::KernelFailed(format!("buffer {} was poisoned by a panicking invocation", bound.handle))
        })
    }

    fn lock_write(&self, view: SlotView) -> Result<RwLockWriteGuard<'_, Vec<u8>>> {
        let bound = &self.buffers[view.buffer];
        bound.data.write().map_err(|_| {
            Error::KernelFailed(format!("buffer {} was poisoned by a panicking invocation", bound.handle))
        })
    }
}

fn element_range<T: Pod>(index: usize, len: usize) -> Result<std::ops::Range<usize>> {
    let width = std::mem::size_of::<T>();
    let start = index.saturating_mul(width);
    let end = start.saturating_add(width);
    if end > len {
        return Err(Error::BufferTooSmall {
            size: end as u64,
            capacity: len as u64,
        });
    }
    Ok(start..end)
}

#[cfg(test)]
#[path = "kernel_args_tests.rs"]
mod tests;
