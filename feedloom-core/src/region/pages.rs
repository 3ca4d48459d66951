//! Platform page sources backing a [`Region`](super::Region).
//!
//! A page source owns one reserved address range and can commit or
//! decommit page-aligned pieces of it. This is the only platform-specific
//! part of the allocator.

use feedloom_types::RegionError;
use memmap2::MmapMut;

/// Largest OS page size we expect to meet (arm64 with 64 KiB pages).
///
/// Decommit rounds its start up to this so a partially used OS page is
/// never discarded.
const MAX_OS_PAGE: usize = 64 * 1024;

/// Reserve / commit / decommit over one contiguous range.
pub trait PageSource: Sized {
    /// Reserves `bytes` of address space without committing memory.
    fn reserve(bytes: usize) -> Result<Self, RegionError>;

    /// Makes `offset..offset + len` usable.
    fn commit(&mut self, offset: usize, len: usize) -> Result<(), RegionError>;

    /// Returns `offset..offset + len` to the system. The range stays reserved
    /// and reads back as zeroes once committed again.
    fn decommit(&mut self, offset: usize, len: usize) -> Result<(), RegionError>;

    /// Bytes from the start of the reservation. At least every committed
    /// byte is addressable.
    fn as_slice(&self) -> &[u8];

    /// Mutable view matching [`as_slice`](Self::as_slice).
    fn as_mut_slice(&mut self) -> &mut [u8];
}

/// Anonymous private memory mapping.
///
/// The kernel backs pages lazily on first touch, so reserving a large range
/// costs address space only. Decommit uses `MADV_DONTNEED`.
pub struct VirtualPages {
    map: MmapMut,
}

impl PageSource for VirtualPages {
    fn reserve(bytes: usize) -> Result<Self, RegionError> {
        let map = MmapMut::map_anon(bytes).map_err(|e| RegionError::Reserve {
            bytes,
            reason: e.to_string(),
        })?;
        Ok(Self { map })
    }

    fn commit(&mut self, offset: usize, len: usize) -> Result<(), RegionError> {
        if offset + len > self.map.len() {
            return Err(RegionError::Exhausted {
                requested: offset + len,
                reserved: self.map.len(),
            });
        }
        #[cfg(unix)]
        {
            // Prefault hint only.
            if let Err(e) = self
                .map
                .advise_range(memmap2::Advice::WillNeed, offset, len)
            {
                log::trace!(target: "feedloom.region", "willneed advise at {} failed: {}", offset, e);
            }
        }
        Ok(())
    }

    fn decommit(&mut self, offset: usize, len: usize) -> Result<(), RegionError> {
        let end = (offset + len).min(self.map.len());
        let start = offset.next_multiple_of(MAX_OS_PAGE);
        if start >= end {
            return Ok(());
        }
        #[cfg(unix)]
        {
            // SAFETY: the mapping is private and anonymous, so dropping pages
            // only zeroes them. `&mut self` guarantees no outstanding borrows
            // into the range, and the caller only decommits bytes above its
            // live watermark.
            unsafe {
                self.map
                    .unchecked_advise_range(memmap2::UncheckedAdvice::DontNeed, start, end - start)
            }
            .map_err(|e| RegionError::Commit {
                offset: start,
                len: end - start,
                reason: e.to_string(),
            })?;
        }
        #[cfg(not(unix))]
        {
            self.map[start..end].fill(0);
        }
        Ok(())
    }

    #[inline(always)]
    fn as_slice(&self) -> &[u8] {
        &self.map
    }

    #[inline(always)]
    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map
    }
}

/// Heap-backed page source.
///
/// Commits by growing a `Vec` and decommits by truncating it. Offsets stay
/// valid across growth even though the buffer may move, since regions hand
/// out offsets rather than pointers.
pub struct HeapPages {
    buffer: Vec<u8>,
    reserved: usize,
}

impl PageSource for HeapPages {
    fn reserve(bytes: usize) -> Result<Self, RegionError> {
        Ok(Self {
            buffer: Vec::new(),
            reserved: bytes,
        })
    }

    fn commit(&mut self, offset: usize, len: usize) -> Result<(), RegionError> {
        let end = offset + len;
        if end > self.reserved {
            return Err(RegionError::Exhausted {
                requested: end,
                reserved: self.reserved,
            });
        }
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        Ok(())
    }

    fn decommit(&mut self, offset: usize, _len: usize) -> Result<(), RegionError> {
        if offset < self.buffer.len() {
            self.buffer.truncate(offset);
            self.buffer.shrink_to(offset);
        }
        Ok(())
    }

    #[inline(always)]
    fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    #[inline(always)]
    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}
