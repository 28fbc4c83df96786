/// Generation-checked buffer arena
///
/// Architecture:
/// - slots: `Vec<Option<Buffer>>`, indexed by handle index
/// - SlotAllocator: per-slot generation counters + LIFO free-list
/// - budget: `total_allocated <= max_size`, enforced before any mutation
///
/// A handle is valid iff its index is in range, the slot is occupied and the
/// slot's generation equals the handle's generation. Freeing bumps the
/// generation, which permanently invalidates every handle issued before.

use std::fmt;
use crate::compute::{Buffer, BufferUsage};
use crate::error::{Error, Result};
use crate::utils::SlotAllocator;

// ===== BUFFER HANDLE =====

/// Opaque, copyable reference to a pooled buffer
///
/// Not an owning pointer: validity is re-checked against the pool on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle {
    index: u32,
    generation: u32,
}

impl BufferHandle {
    /// Build a handle from raw parts (serialization, tests)
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation the handle was issued for
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// ===== BUFFER POOL =====

/// Slot allocator for compute buffers with a byte budget
pub struct BufferPool {
    slots: Vec<Option<Buffer>>,
    allocator: SlotAllocator,
    total_allocated: u64,
    max_size: u64,
}

impl BufferPool {
    /// Create an empty pool that may hold at most `max_size` bytes
    pub fn new(max_size: u64) -> Self {
        Self {
            slots: Vec::new(),
            allocator: SlotAllocator::new(),
            total_allocated: 0,
            max_size,
        }
    }

    /// Allocate a zero-initialized buffer of `size` bytes
    ///
    /// Reuses the most recently freed slot (keeping its current generation)
    /// or appends a new slot with generation 0.
    ///
    /// # Errors
    ///
    /// `Error::OutOfMemory` if the allocation would exceed the pool budget.
    /// The pool is left untouched in that case.
    pub fn allocate(&mut self, size: u64, usage: BufferUsage) -> Result<BufferHandle> {
        let available = self.available();
        let out_of_memory = Error::OutOfMemory { requested: size, available };
        if size > available {
            return Err(out_of_memory);
        }
        let byte_len = usize::try_from(size).map_err(|_| out_of_memory)?;

        let buffer = Buffer::new(byte_len, usage);
        let (index, generation) = self.allocator.alloc();
        let slot = index as usize;
        if slot == self.slots.len() {
            self.slots.push(Some(buffer));
        } else {
            self.slots[slot] = Some(buffer);
        }
        self.total_allocated += size;

        Ok(BufferHandle { index, generation })
    }

    /// Buffer behind `handle`, `None` if the handle is stale or out of range
    pub fn get(&self, handle: BufferHandle) -> Option<&Buffer> {
        if !self.allocator.is_live(handle.index, handle.generation) {
            return None;
        }
        self.slots.get(handle.index as usize)?.as_ref()
    }

    /// Mutable buffer behind `handle`, `None` if the handle is stale or out of range
    pub fn get_mut(&mut self, handle: BufferHandle) -> Option<&mut Buffer> {
        if !self.allocator.is_live(handle.index, handle.generation) {
            return None;
        }
        self.slots.get_mut(handle.index as usize)?.as_mut()
    }

    /// Whether `handle` currently names a live buffer
    pub fn contains(&self, handle: BufferHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Release the buffer behind `handle`
    ///
    /// Returns `false` for an already invalid handle (no-op, not an error).
    /// Otherwise the storage is dropped, the budget credited, the slot's
    /// generation incremented and the index pushed onto the free-list.
    pub fn free(&mut self, handle: BufferHandle) -> bool {
        if !self.allocator.is_live(handle.index, handle.generation) {
            return false;
        }
        let released = self.slots
            .get_mut(handle.index as usize)
            .and_then(|slot| slot.take());
        if let Some(buffer) = released {
            self.total_allocated -= buffer.size();
        }
        self.allocator.free(handle.index, handle.generation)
    }

    /// Current generation of slot `index`, `None` if the slot never existed
    pub fn generation(&self, index: u32) -> Option<u32> {
        self.allocator.generation(index)
    }

    /// Bytes currently allocated
    pub fn total_allocated(&self) -> u64 {
        self.total_allocated
    }

    /// Pool budget in bytes
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Bytes still available for allocation
    pub fn available(&self) -> u64 {
        self.max_size - self.total_allocated
    }

    /// Number of slots (live or free)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool has never allocated a slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of live buffers
    pub fn live_count(&self) -> u32 {
        self.allocator.len()
    }

    /// Number of freed slots waiting to be reused
    pub fn free_slot_count(&self) -> usize {
        self.allocator.free_count()
    }
}

#[cfg(test)]
#[path = "buffer_pool_tests.rs"]
mod tests;
