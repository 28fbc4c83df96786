use super::*;
use crate::compute::BufferUsage;

fn pool_with(contents: &[&[u8]]) -> (BufferPool, Vec<BufferHandle>) {
    let mut pool = BufferPool::new(1024);
    let handles = contents
        .iter()
        .map(|bytes| {
            let handle = pool.allocate(bytes.len() as u64, BufferUsage::STORAGE).unwrap();
            pool.get_mut(handle).unwrap().upload(bytes).unwrap();
            handle
        })
        .collect();
    (pool, handles)
}

fn binding(slot: u32, buffer: BufferHandle, access: Access) -> Binding {
    Binding { slot, buffer, access }
}

// ============================================================================
// Bind / release tests
// ============================================================================

#[test]
fn test_bind_moves_contents_and_release_restores() {
    let (mut pool, handles) = pool_with(&[&[1, 2, 3, 4]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::ReadWrite)]).unwrap();

    assert!(pool.get(handles[0]).unwrap().as_bytes().is_empty());
    assert_eq!(pool.get(handles[0]).unwrap().size(), 4);

    args.write(0, |bytes| bytes[0] = 42).unwrap();
    args.release(&mut pool);

    assert_eq!(pool.get(handles[0]).unwrap().as_bytes(), &[42, 2, 3, 4]);
}

#[test]
fn test_bind_stale_handle_leaves_pool_untouched() {
    let (mut pool, handles) = pool_with(&[&[1, 2], &[3, 4]]);
    let stale = handles[1];
    pool.free(stale);

    let result = KernelArgs::bind(&mut pool, &[
        binding(0, handles[0], Access::ReadOnly),
        binding(1, stale, Access::WriteOnly),
    ]);

    assert!(matches!(result, Err(Error::InvalidHandle(h)) if h == stale));
    assert_eq!(pool.get(handles[0]).unwrap().as_bytes(), &[1, 2]);
}

#[test]
fn test_duplicate_buffer_is_bound_once_with_merged_access() {
    let (mut pool, handles) = pool_with(&[&[7, 7]]);
    let args = KernelArgs::bind(&mut pool, &[
        binding(0, handles[0], Access::ReadOnly),
        binding(1, handles[0], Access::WriteOnly),
    ]).unwrap();

    assert_eq!(args.buffer_count(), 1);
    assert_eq!(args.access(0), Some(Access::ReadOnly));
    assert_eq!(args.access(1), Some(Access::WriteOnly));
    assert_eq!(args.buffer_access(0), Some(Access::ReadWrite));

    args.write_pod::<u8>(1, 0, 9).unwrap();
    assert_eq!(args.read_pod::<u8>(0, 0).unwrap(), 9);
    args.release(&mut pool);
    assert_eq!(pool.get(handles[0]).unwrap().as_bytes(), &[9, 7]);
}

#[test]
fn test_empty_args() {
    let args = KernelArgs::empty();
    assert_eq!(args.buffer_count(), 0);
    assert!(args.handle(0).is_none());
    assert!(matches!(args.byte_len(0), Err(Error::InvalidBinding(_))));
}

// ============================================================================
// Access enforcement tests
// ============================================================================

#[test]
fn test_read_only_slot_rejects_writes() {
    let (mut pool, handles) = pool_with(&[&[0; 8]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::ReadOnly)]).unwrap();

    assert!(args.read(0, |bytes| bytes.len()).is_ok());
    assert!(matches!(args.write(0, |_| ()), Err(Error::InvalidBinding(_))));
    assert!(matches!(args.write_pod::<u32>(0, 0, 1), Err(Error::InvalidBinding(_))));
    args.release(&mut pool);
}

#[test]
fn test_write_only_slot_rejects_reads() {
    let (mut pool, handles) = pool_with(&[&[0; 8]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::WriteOnly)]).unwrap();

    assert!(args.write_pod::<u32>(0, 1, 5).is_ok());
    assert!(matches!(args.read(0, |_| ()), Err(Error::InvalidBinding(_))));
    assert!(matches!(args.read_pod::<u32>(0, 0), Err(Error::InvalidBinding(_))));
    args.release(&mut pool);
}

#[test]
fn test_unbound_slot_is_invalid_binding() {
    let (mut pool, handles) = pool_with(&[&[0; 4]]);
    let args = KernelArgs::bind(&mut pool, &[binding(2, handles[0], Access::ReadWrite)]).unwrap();

    assert_eq!(args.handle(2), Some(handles[0]));
    assert!(matches!(args.read_pod::<u8>(0, 0), Err(Error::InvalidBinding(_))));
    args.release(&mut pool);
}

// ============================================================================
// Typed access tests
// ============================================================================

#[test]
fn test_pod_elements_are_little_endian_slices() {
    let (mut pool, handles) = pool_with(&[&[0; 12]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::ReadWrite)]).unwrap();

    args.write_pod::<f32>(0, 2, 1.5).unwrap();
    assert_eq!(args.read_pod::<f32>(0, 2).unwrap(), 1.5);
    assert_eq!(args.read_pod::<f32>(0, 0).unwrap(), 0.0);
    assert_eq!(args.byte_len(0).unwrap(), 12);
    args.release(&mut pool);

    let mut out = [0f32; 3];
    pool.get(handles[0]).unwrap().download_pod(&mut out);
    assert_eq!(out, [0.0, 0.0, 1.5]);
}

#[test]
fn test_pod_out_of_range_is_buffer_too_small() {
    let (mut pool, handles) = pool_with(&[&[0; 6]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::ReadWrite)]).unwrap();

    assert_eq!(
        args.read_pod::<u32>(0, 1),
        Err(Error::BufferTooSmall { size: 8, capacity: 6 })
    );
    assert!(args.write_pod::<u32>(0, usize::MAX, 0).is_err());
    args.release(&mut pool);
}

// ============================================================================
// Concurrency tests
// ============================================================================

#[test]
fn test_concurrent_writers_all_land() {
    let (mut pool, handles) = pool_with(&[&[0; 256]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::WriteOnly)]).unwrap();

    std::thread::scope(|scope| {
        for worker in 0..8usize {
            let args = &args;
            scope.spawn(move || {
                for i in 0..8usize {
                    let index = worker * 8 + i;
                    args.write_pod::<u32>(0, index, index as u32 + 1).unwrap();
                }
            });
        }
    });
    args.release(&mut pool);

    let mut out = [0u32; 64];
    pool.get(handles[0]).unwrap().download_pod(&mut out);
    assert!(out.iter().enumerate().all(|(i, &v)| v == i as u32 + 1));
}

#[test]
fn test_batched_write_stores_whole_range() {
    let (mut pool, handles) = pool_with(&[&[0; 8]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::WriteOnly)]).unwrap();

    let values = [3u16, 5, 7, 9];
    args.write(0, |bytes| bytes.copy_from_slice(bytemuck::cast_slice(&values))).unwrap();
    args.release(&mut pool);

    let mut out = [0u16; 4];
    pool.get(handles[0]).unwrap().download_pod(&mut out);
    assert_eq!(out, values);
}

#[test]
fn test_poisoned_buffer_reports_kernel_failed_and_is_restored() {
    let (mut pool, handles) = pool_with(&[&[1, 2, 3, 4]]);
    let args = KernelArgs::bind(&mut pool, &[binding(0, handles[0], Access::ReadWrite)]).unwrap();

    let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        args.write(0, |bytes| {
            bytes[0] = 9;
            panic!("writer died");
        })
    }));
    assert!(panicked.is_err());
    assert!(matches!(args.read_pod::<u8>(0, 0), Err(Error::KernelFailed(_))));

    args.release(&mut pool);
    assert_eq!(pool.get(handles[0]).unwrap().as_bytes(), &[9, 2, 3, 4]);
}
