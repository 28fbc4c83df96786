use super::*;

// ============================================================================
// Basic allocation tests
// ============================================================================

#[test]
fn test_sequential_alloc() {
    let mut alloc = SlotAllocator::new();
    assert_eq!(alloc.alloc(), (0, 0));
    assert_eq!(alloc.alloc(), (1, 0));
    assert_eq!(alloc.alloc(), (2, 0));
}

#[test]
fn test_new_is_empty() {
    let alloc = SlotAllocator::default();
    assert!(alloc.is_empty());
    assert_eq!(alloc.len(), 0);
    assert_eq!(alloc.high_water_mark(), 0);
    assert_eq!(alloc.generation(0), None);
}

// ============================================================================
// Free and recycle tests
// ============================================================================

#[test]
fn test_free_bumps_generation_and_recycles() {
    let mut alloc = SlotAllocator::new();
    let (a, gen_a) = alloc.alloc();
    assert!(alloc.free(a, gen_a));
    assert_eq!(alloc.generation(a), Some(1));
    assert!(!alloc.is_live(a, gen_a));

    // Recycled slot keeps the bumped generation
    assert_eq!(alloc.alloc(), (0, 1));
    assert!(alloc.is_live(0, 1));
}

#[test]
fn test_free_multiple_recycle_lifo() {
    // Free list is a stack (LIFO): last freed = first recycled
    let mut alloc = SlotAllocator::new();
    let a = alloc.alloc(); // 0
    let _b = alloc.alloc(); // 1
    let c = alloc.alloc(); // 2
    alloc.free(a.0, a.1);
    alloc.free(c.0, c.1);
    assert_eq!(alloc.free_count(), 2);

    assert_eq!(alloc.alloc(), (2, 1));
    assert_eq!(alloc.alloc(), (0, 1));
    // Free list exhausted, next is fresh
    assert_eq!(alloc.alloc(), (3, 0));
}

#[test]
fn test_double_free_is_rejected() {
    let mut alloc = SlotAllocator::new();
    let (index, generation) = alloc.alloc();
    assert!(alloc.free(index, generation));
    assert!(!alloc.free(index, generation));

    // Only one increment, only one free-list entry
    assert_eq!(alloc.generation(index), Some(1));
    assert_eq!(alloc.free_count(), 1);
    assert!(alloc.is_empty());
}

#[test]
fn test_freed_slot_with_current_generation_is_not_live() {
    let mut alloc = SlotAllocator::new();
    let (index, generation) = alloc.alloc();
    alloc.free(index, generation);

    // Generation 1 is the slot's current generation, but nothing holds it yet
    assert!(!alloc.is_live(index, 1));
    assert!(!alloc.free(index, 1));
}

#[test]
fn test_out_of_range_is_not_live() {
    let mut alloc = SlotAllocator::new();
    alloc.alloc();
    assert!(!alloc.is_live(5, 0));
    assert!(!alloc.free(5, 0));
    assert_eq!(alloc.len(), 1);
}

// ============================================================================
// len() and high_water_mark() tests
// ============================================================================

#[test]
fn test_high_water_mark_never_decreases() {
    let mut alloc = SlotAllocator::new();
    let a = alloc.alloc();
    let b = alloc.alloc();
    assert_eq!(alloc.high_water_mark(), 2);

    // Freeing does NOT reduce the high water mark
    alloc.free(a.0, a.1);
    alloc.free(b.0, b.1);
    assert_eq!(alloc.high_water_mark(), 2);
    assert_eq!(alloc.len(), 0);

    alloc.alloc(); // 1 (recycled)
    alloc.alloc(); // 0 (recycled)
    assert_eq!(alloc.high_water_mark(), 2);

    alloc.alloc(); // 2 (fresh)
    assert_eq!(alloc.high_water_mark(), 3);
}

// ============================================================================
// Stress / pattern tests
// ============================================================================

#[test]
fn test_generation_increases_by_one_per_free() {
    let mut alloc = SlotAllocator::new();

    for expected in 0..100u32 {
        let (index, generation) = alloc.alloc();
        assert_eq!(index, 0);
        assert_eq!(generation, expected);
        alloc.free(index, generation);
        assert_eq!(alloc.generation(0), Some(expected + 1));
    }
    assert_eq!(alloc.high_water_mark(), 1);
}

#[test]
fn test_live_pairs_are_unique() {
    let mut alloc = SlotAllocator::new();
    let mut live = std::collections::HashSet::new();

    for _ in 0..50 {
        live.insert(alloc.alloc());
    }
    let to_free: Vec<(u32, u32)> = live.iter().copied().filter(|(i, _)| i % 3 == 0).collect();
    for pair in to_free {
        assert!(alloc.free(pair.0, pair.1));
        live.remove(&pair);
    }
    for _ in 0..20 {
        let pair = alloc.alloc();
        assert!(live.insert(pair), "duplicate live slot: {:?}", pair);
    }
    assert_eq!(live.len() as u32, alloc.len());
}
