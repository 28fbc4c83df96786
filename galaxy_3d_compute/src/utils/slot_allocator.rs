/// Allocates and recycles generation-checked `u32` slot indices.
///
/// Manages a pool of slot indices for pooled buffers or any system that
/// needs stable, reusable integer identifiers. Freed indices are recycled
/// LIFO on subsequent allocations. Each slot carries a generation counter
/// that is bumped on free, so an `(index, generation)` pair issued before
/// the free never matches the slot again.
///
/// # Example
///
/// ```ignore
/// let mut alloc = SlotAllocator::new();
/// let a = alloc.alloc();  // (0, 0)
/// let b = alloc.alloc();  // (1, 0)
/// alloc.free(a.0, a.1);   // slot 0 is now available, generation 1
/// let c = alloc.alloc();  // (0, 1) (recycled)
/// ```
pub struct SlotAllocator {
    free_list: Vec<u32>,
    generations: Vec<u32>,
    occupied: Vec<bool>,
    len: u32,
}

impl SlotAllocator {
    /// Create a new empty allocator
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            generations: Vec::new(),
            occupied: Vec::new(),
            len: 0,
        }
    }

    /// Allocate the next available slot, returning `(index, generation)`
    ///
    /// A recycled slot keeps the generation it was given by its last free;
    /// a fresh slot starts at generation 0.
    pub fn alloc(&mut self) -> (u32, u32) {
        self.len += 1;
        match self.free_list.pop() {
            Some(index) => {
                self.occupied[index as usize] = true;
                (index, self.generations[index as usize])
            }
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.occupied.push(true);
                (index, 0)
            }
        }
    }

    /// Return a slot to the pool for reuse
    ///
    /// Returns `false` (and changes nothing) if the pair does not name a live slot.
    pub fn free(&mut self, index: u32, generation: u32) -> bool {
        if !self.is_live(index, generation) {
            return false;
        }
        let slot = index as usize;
        self.occupied[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.len -= 1;
        self.free_list.push(index);
        true
    }

    /// Whether `(index, generation)` names a currently allocated slot
    pub fn is_live(&self, index: u32, generation: u32) -> bool {
        let slot = index as usize;
        slot < self.generations.len()
            && self.occupied[slot]
            && self.generations[slot] == generation
    }

    /// Current generation of a slot, `None` if the index was never allocated
    pub fn generation(&self, index: u32) -> Option<u32> {
        self.generations.get(index as usize).copied()
    }

    /// Highest index ever allocated + 1.
    ///
    /// This is the minimum capacity the backing storage must have
    /// to accommodate all allocated indices.
    pub fn high_water_mark(&self) -> u32 {
        self.generations.len() as u32
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no slots are currently allocated
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of freed slots waiting to be recycled
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
