use std::collections::HashMap;

use thiserror::Error;

/// Allocation granularity and alignment, in bytes.
pub const HEAP_ALIGN: u32 = 16;

const INITIAL_BYTES: u32 = 64 * 1024;
const MAX_BYTES: u32 = 256 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory { requested: u32 },
    #[error("free of unallocated pointer {0:#x}")]
    InvalidFree(u32),
    #[error("access of {len} bytes at {ptr:#x} is outside the heap")]
    OutOfBounds { ptr: u32, len: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeBlock {
    offset: u32,
    size: u32,
}

/// Byte-addressed linear memory shared across the native boundary.
///
/// Callers address it by `u32` offsets, never by host pointers. Offset 0 is
/// reserved so it can serve as the null pointer.
pub struct LinearHeap {
    memory: Vec<u8>,
    /// Sorted by offset; adjacent blocks are always merged.
    free: Vec<FreeBlock>,
    live: HashMap<u32, u32>,
}

impl LinearHeap {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BYTES)
    }

    pub fn with_capacity(bytes: u32) -> Self {
        let bytes = align_up(bytes.max(2 * HEAP_ALIGN));
        Self {
            memory: vec![0; bytes as usize],
            free: vec![FreeBlock {
                offset: HEAP_ALIGN,
                size: bytes - HEAP_ALIGN,
            }],
            live: HashMap::new(),
        }
    }

    /// Reserve `bytes` (rounded up to [`HEAP_ALIGN`]) and return the offset.
    pub fn malloc(&mut self, bytes: u32) -> Result<u32, HeapError> {
        let size = align_up(bytes.max(1));
        let slot = match self.free.iter().position(|b| b.size >= size) {
            Some(slot) => slot,
            None => {
                self.grow(size)?;
                self.free
                    .iter()
                    .position(|b| b.size >= size)
                    .ok_or(HeapError::OutOfMemory { requested: bytes })?
            }
        };

        let block = self.free[slot];
        if block.size == size {
            self.free.remove(slot);
        } else {
            self.free[slot] = FreeBlock {
                offset: block.offset + size,
                size: block.size - size,
            };
        }
        self.live.insert(block.offset, size);
        Ok(block.offset)
    }

    /// Release an allocation. Freeing offset 0 is a no-op.
    pub fn free(&mut self, ptr: u32) -> Result<(), HeapError> {
        if ptr == 0 {
            return Ok(());
        }
        let size = self.live.remove(&ptr).ok_or(HeapError::InvalidFree(ptr))?;
        let slot = self.free.partition_point(|b| b.offset < ptr);
        self.free.insert(slot, FreeBlock { offset: ptr, size });
        self.coalesce_around(slot);
        Ok(())
    }

    /// Number of outstanding allocations.
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn capacity(&self) -> u32 {
        self.memory.len() as u32
    }

    pub fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), HeapError> {
        let range = self.range(ptr, bytes.len())?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_bytes(&self, ptr: u32, len: usize) -> Result<&[u8], HeapError> {
        let range = self.range(ptr, len)?;
        Ok(&self.memory[range])
    }

    pub fn write_f32(&mut self, ptr: u32, values: &[f32]) -> Result<(), HeapError> {
        self.write_bytes(ptr, bytemuck::cast_slice(values))
    }

    pub fn read_f32<const N: usize>(&self, ptr: u32) -> Result<[f32; N], HeapError> {
        let bytes = self.read_bytes(ptr, N * std::mem::size_of::<f32>())?;
        let mut out = [0.0f32; N];
        for (value, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = bytemuck::pod_read_unaligned(chunk);
        }
        Ok(out)
    }

    /// Allocate and fill a NUL-terminated UTF-8 string.
    pub fn alloc_c_string(&mut self, s: &str) -> Result<u32, HeapError> {
        let ptr = self.malloc(s.len() as u32 + 1)?;
        self.write_bytes(ptr, s.as_bytes())?;
        self.write_bytes(ptr + s.len() as u32, &[0])?;
        Ok(ptr)
    }

    /// Read a NUL-terminated string. Invalid UTF-8 is replaced, not rejected.
    pub fn read_c_string(&self, ptr: u32) -> Result<String, HeapError> {
        let start = self.range(ptr, 0)?.start;
        let tail = &self.memory[start..];
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(HeapError::OutOfBounds { ptr, len: tail.len() as u32 })?;
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }

    fn range(&self, ptr: u32, len: usize) -> Result<std::ops::Range<usize>, HeapError> {
        let start = ptr as usize;
        let end = start.checked_add(len);
        match end {
            Some(end) if ptr != 0 && end <= self.memory.len() => Ok(start..end),
            _ => Err(HeapError::OutOfBounds { ptr, len: len as u32 }),
        }
    }

    fn grow(&mut self, needed: u32) -> Result<(), HeapError> {
        let old = self.capacity();
        let new = old
            .saturating_mul(2)
            .max(old.saturating_add(needed))
            .min(MAX_BYTES);
        if new <= old {
            return Err(HeapError::OutOfMemory { requested: needed });
        }
        self.memory.resize(new as usize, 0);
        self.free.push(FreeBlock {
            offset: old,
            size: new - old,
        });
        self.coalesce_around(self.free.len() - 1);
        log::debug!("linear heap grew {old} -> {new} bytes");
        Ok(())
    }

    fn coalesce_around(&mut self, slot: usize) {
        if slot + 1 < self.free.len() {
            let (cur, next) = (self.free[slot], self.free[slot + 1]);
            if cur.offset + cur.size == next.offset {
                self.free[slot].size += next.size;
                self.free.remove(slot + 1);
            }
        }
        if slot > 0 {
            let (prev, cur) = (self.free[slot - 1], self.free[slot]);
            if prev.offset + prev.size == cur.offset {
                self.free[slot - 1].size += cur.size;
                self.free.remove(slot);
            }
        }
    }
}

impl Default for LinearHeap {
    fn default() -> Self {
        Self::new()
    }
}

fn align_up(bytes: u32) -> u32 {
    bytes.div_ceil(HEAP_ALIGN).saturating_mul(HEAP_ALIGN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malloc_is_aligned_and_nonzero() {
        let mut heap = LinearHeap::new();
        let a = heap.malloc(3).unwrap();
        let b = heap.malloc(64).unwrap();
        assert_ne!(a, 0);
        assert_eq!(a % HEAP_ALIGN, 0);
        assert_eq!(b % HEAP_ALIGN, 0);
        assert!(b >= a + HEAP_ALIGN);
    }

    #[test]
    fn test_free_reuses_space() {
        let mut heap = LinearHeap::new();
        let a = heap.malloc(64).unwrap();
        heap.free(a).unwrap();
        let b = heap.malloc(64).unwrap();
        assert_eq!(a, b);
        assert_eq!(heap.live_allocations(), 1);
    }

    #[test]
    fn test_coalescing_allows_larger_block() {
        let mut heap = LinearHeap::with_capacity(1024);
        let a = heap.malloc(256).unwrap();
        let b = heap.malloc(256).unwrap();
        let c = heap.malloc(256).unwrap();
        heap.free(a).unwrap();
        heap.free(c).unwrap();
        heap.free(b).unwrap();
        let big = heap.malloc(900).unwrap();
        assert_eq!(big, a);
        assert_eq!(heap.capacity(), 1024);
    }

    #[test]
    fn test_grow_when_exhausted() {
        let mut heap = LinearHeap::with_capacity(128);
        let ptr = heap.malloc(4096).unwrap();
        heap.write_f32(ptr, &[1.0; 1024]).unwrap();
        assert!(heap.capacity() >= 4096 + HEAP_ALIGN);
    }

    #[test]
    fn test_double_free_rejected() {
        let mut heap = LinearHeap::new();
        let a = heap.malloc(16).unwrap();
        heap.free(a).unwrap();
        assert_eq!(heap.free(a), Err(HeapError::InvalidFree(a)));
        assert_eq!(heap.free(0), Ok(()));
    }

    #[test]
    fn test_f32_round_trip() {
        let mut heap = LinearHeap::new();
        let ptr = heap.malloc(16 * 4).unwrap();
        let values: Vec<f32> = (0..16).map(|i| i as f32 * 0.5).collect();
        heap.write_f32(ptr, &values).unwrap();
        let back: [f32; 16] = heap.read_f32(ptr).unwrap();
        assert_eq!(&back[..], &values[..]);
    }

    #[test]
    fn test_c_string_round_trip() {
        let mut heap = LinearHeap::new();
        let ptr = heap.alloc_c_string("#pragma size 64 64").unwrap();
        assert_eq!(heap.read_c_string(ptr).unwrap(), "#pragma size 64 64");
    }

    #[test]
    fn test_null_and_out_of_range_access() {
        let heap = LinearHeap::with_capacity(256);
        assert!(heap.read_bytes(0, 4).is_err());
        assert!(heap.read_bytes(250, 16).is_err());
    }
}
