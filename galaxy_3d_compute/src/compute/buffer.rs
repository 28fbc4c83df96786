/// Pooled compute buffer and buffer usage flags
///
/// A Buffer is a zero-initialized, fixed-size byte store owned by a
/// BufferPool slot. Callers never hold a Buffer directly; they hold a
/// BufferHandle and go through the pool or the Context.

use bitflags::bitflags;
use bytemuck::Pod;
use crate::error::{Error, Result};

bitflags! {
    /// Buffer usage flags (combinable)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex buffer
        const VERTEX = 1 << 0;
        /// Index buffer
        const INDEX = 1 << 1;
        /// Uniform/constant buffer
        const UNIFORM = 1 << 2;
        /// Storage buffer (read/write from kernels)
        const STORAGE = 1 << 3;
        /// Source of transfer operations (download)
        const TRANSFER_SRC = 1 << 4;
        /// Destination of transfer operations (upload)
        const TRANSFER_DST = 1 << 5;
    }
}

/// Host-side compute buffer
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u8>,
    size: u64,
    usage: BufferUsage,
    mapped: bool,
}

impl Buffer {
    /// Create a zero-initialized buffer of `size` bytes
    pub(crate) fn new(size: usize, usage: BufferUsage) -> Self {
        Self {
            data: vec![0; size],
            size: size as u64,
            usage,
            mapped: true,
        }
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Usage flags the buffer was created with
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Whether the contents are host-visible
    ///
    /// Pool buffers live in host memory, so this is always true; device-local
    /// storage would report false.
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// Copy `data` to the start of the buffer
    ///
    /// # Errors
    ///
    /// `Error::BufferTooSmall` if `data` is larger than the buffer.
    pub fn upload(&mut self, data: &[u8]) -> Result<()> {
        if data.len() as u64 > self.size {
            return Err(Error::BufferTooSmall {
                size: data.len() as u64,
                capacity: self.size,
            });
        }
        debug_assert_eq!(self.data.len() as u64, self.size, "buffer contents not resident");
        self.data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy the start of the buffer into `out`
    ///
    /// Copies `min(out.len(), size)` bytes and returns that count. A short
    /// buffer is not an error: the remainder of `out` is left untouched.
    pub fn download(&self, out: &mut [u8]) -> usize {
        debug_assert_eq!(self.data.len() as u64, self.size, "buffer contents not resident");
        let count = out.len().min(self.size as usize);
        out[..count].copy_from_slice(&self.data[..count]);
        count
    }

    /// Upload a slice of plain-old-data values
    pub fn upload_pod<T: Pod>(&mut self, values: &[T]) -> Result<()> {
        self.upload(bytemuck::cast_slice(values))
    }

    /// Download into a slice of plain-old-data values, returning the bytes copied
    pub fn download_pod<T: Pod>(&self, out: &mut [T]) -> usize {
        self.download(bytemuck::cast_slice_mut(out))
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Move the contents out for CPU kernel execution, leaving the buffer empty
    ///
    /// `size` keeps reporting the capacity; the contents must come back
    /// through `restore_data` before the buffer is used again.
    pub(crate) fn take_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// Put back contents previously removed with `take_data`
    pub(crate) fn restore_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
