use super::*;

// ============================================================================
// Creation tests
// ============================================================================

#[test]
fn test_new_buffer_is_zeroed() {
    let buffer = Buffer::new(64, BufferUsage::STORAGE);
    assert_eq!(buffer.size(), 64);
    assert!(buffer.as_bytes().iter().all(|&b| b == 0));
    assert!(buffer.is_mapped());
}

#[test]
fn test_usage_flags_combine() {
    let usage = BufferUsage::STORAGE | BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST;
    let buffer = Buffer::new(4, usage);
    assert!(buffer.usage().contains(BufferUsage::STORAGE));
    assert!(buffer.usage().contains(BufferUsage::TRANSFER_DST));
    assert!(!buffer.usage().contains(BufferUsage::VERTEX));
}

// ============================================================================
// Upload / download tests
// ============================================================================

#[test]
fn test_upload_then_download_matches() {
    let mut buffer = Buffer::new(16, BufferUsage::STORAGE);
    let data: Vec<u8> = (1..=16).collect();
    buffer.upload(&data).unwrap();

    let mut out = vec![0u8; 16];
    assert_eq!(buffer.download(&mut out), 16);
    assert_eq!(out, data);
}

#[test]
fn test_partial_upload_keeps_tail() {
    let mut buffer = Buffer::new(8, BufferUsage::STORAGE);
    buffer.upload(&[9, 9, 9, 9, 9, 9, 9, 9]).unwrap();
    buffer.upload(&[1, 2]).unwrap();
    assert_eq!(buffer.as_bytes(), &[1, 2, 9, 9, 9, 9, 9, 9]);
}

#[test]
fn test_upload_too_large_fails_without_writing() {
    let mut buffer = Buffer::new(4, BufferUsage::STORAGE);
    let result = buffer.upload(&[1, 2, 3, 4, 5]);
    assert_eq!(result, Err(Error::BufferTooSmall { size: 5, capacity: 4 }));
    assert_eq!(buffer.as_bytes(), &[0, 0, 0, 0]);
}

#[test]
fn test_download_truncates_to_buffer_size() {
    let mut buffer = Buffer::new(4, BufferUsage::STORAGE);
    buffer.upload(&[1, 2, 3, 4]).unwrap();

    let mut out = [0xAAu8; 6];
    assert_eq!(buffer.download(&mut out), 4);
    assert_eq!(out, [1, 2, 3, 4, 0xAA, 0xAA]);
}

#[test]
fn test_download_into_short_slice() {
    let mut buffer = Buffer::new(4, BufferUsage::STORAGE);
    buffer.upload(&[1, 2, 3, 4]).unwrap();

    let mut out = [0u8; 2];
    assert_eq!(buffer.download(&mut out), 2);
    assert_eq!(out, [1, 2]);
}

#[test]
fn test_pod_round_trip() {
    let mut buffer = Buffer::new(16, BufferUsage::STORAGE);
    buffer.upload_pod(&[1.5f32, -2.0, 3.25, 0.0]).unwrap();

    let mut out = [0f32; 4];
    assert_eq!(buffer.download_pod(&mut out), 16);
    assert_eq!(out, [1.5, -2.0, 3.25, 0.0]);
}

#[test]
fn test_take_and_restore_data() {
    let mut buffer = Buffer::new(4, BufferUsage::STORAGE);
    buffer.upload(&[5, 6, 7, 8]).unwrap();

    let data = buffer.take_data();
    assert_eq!(buffer.size(), 4);
    buffer.restore_data(data);
    assert_eq!(buffer.as_bytes(), &[5, 6, 7, 8]);
}
