//! Region Allocator
//!
//! A bump allocator over one large reserved address range. Pages are
//! committed on demand and returned to the system on restore, but the
//! reservation itself is kept for the region's whole life.
//!
//! ## Memory Layout
//!
//! ```text
//! reserved:  [.................................................................]
//! committed: [page0][page1][page2]
//! in use:    [a0  ][a1][a2      ]      <- current
//!                      ^ previous (start of a2)
//! ```
//!
//! Allocations are referenced by [`Allocation`] (offset, length) handles, so
//! they stay valid for the lifetime of the region no matter how much it grows.
//!
//! ## Discipline
//!
//! - Allocation: O(1), 32-byte aligned, zero-filled
//! - Only the most recent allocation can grow in place ([`Region::grow_last`])
//! - [`Region::checkpoint`] / [`Region::restore`] roll back everything
//!   allocated after the checkpoint in O(1) plus the decommit call
//!
//! Regions are not synchronized. Each worker owns its own.

mod pages;

pub use pages::{HeapPages, PageSource, VirtualPages};

use feedloom_types::{RegionConfig, RegionError};

/// Alignment of every allocation.
pub const ALIGNMENT: usize = 32;

/// Handle to bytes allocated from a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    offset: usize,
    len: usize,
}

impl Allocation {
    /// Byte offset from the start of the region.
    #[inline(always)]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Length in bytes.
    #[inline(always)]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Returns true for zero-sized allocations.
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    const fn end(self) -> usize {
        self.offset + self.len
    }
}

/// Saved `(current, previous)` pair of a region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Checkpoint {
    current: usize,
    previous: usize,
}

impl Checkpoint {
    /// Offset of the next free byte when the checkpoint was taken.
    #[inline(always)]
    pub const fn current(self) -> usize {
        self.current
    }
}

/// Bump allocator over a reserved range.
pub struct Region<P: PageSource = VirtualPages> {
    pages: P,
    reserved: usize,
    page_size: usize,
    committed: usize,
    /// Next free byte
    current: usize,
    /// Start of the most recent allocation
    previous: usize,
}

#[inline(always)]
const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

#[cold]
#[inline(never)]
pub(crate) fn fatal(err: RegionError) -> ! {
    log::error!("region allocator: {}", err);
    std::process::abort()
}

impl Region<VirtualPages> {
    /// Reserves a region backed by an anonymous memory mapping.
    pub fn reserve(config: RegionConfig) -> Result<Self, RegionError> {
        Self::reserve_with(config)
    }
}

impl<P: PageSource> Region<P> {
    /// Reserves a region on a specific page source and commits its first page.
    ///
    /// # Errors
    ///
    /// Returns `RegionError::InvalidConfig` for a page size that is not a
    /// power of two or a reservation smaller than one page, and the page
    /// source's error if the reservation itself fails.
    pub fn reserve_with(config: RegionConfig) -> Result<Self, RegionError> {
        if !config.page_size.is_power_of_two() || config.page_size < ALIGNMENT {
            return Err(RegionError::InvalidConfig {
                reason: "page size must be a power of two of at least 32 bytes",
            });
        }
        if config.reserve_bytes < config.page_size {
            return Err(RegionError::InvalidConfig {
                reason: "reservation must hold at least one page",
            });
        }

        let mut pages = P::reserve(config.reserve_bytes)?;
        pages.commit(0, config.page_size)?;

        Ok(Self {
            pages,
            reserved: config.reserve_bytes,
            page_size: config.page_size,
            committed: config.page_size,
            current: 0,
            previous: 0,
        })
    }

    /// Offset of the next free byte.
    #[inline(always)]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Start of the most recent allocation.
    #[inline(always)]
    pub fn previous(&self) -> usize {
        self.previous
    }

    /// Bytes currently committed.
    #[inline(always)]
    pub fn committed(&self) -> usize {
        self.committed
    }

    /// Bytes reserved.
    #[inline(always)]
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Commit granularity.
    #[inline(always)]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Allocates `size` zeroed bytes.
    ///
    /// Never fails from the caller's point of view: if pages cannot be
    /// committed the error is logged and the process aborts.
    #[inline]
    pub fn allocate(&mut self, size: usize) -> Allocation {
        match self.try_allocate(size) {
            Ok(alloc) => alloc,
            Err(e) => fatal(e),
        }
    }

    /// Fallible form of [`allocate`](Self::allocate).
    pub fn try_allocate(&mut self, size: usize) -> Result<Allocation, RegionError> {
        let aligned = align_up(self.current, ALIGNMENT);
        let end = aligned
            .checked_add(size)
            .ok_or(RegionError::Exhausted {
                requested: usize::MAX,
                reserved: self.reserved,
            })?;
        self.ensure_committed(end)?;

        self.previous = aligned;
        self.current = end;
        self.pages.as_mut_slice()[aligned..end].fill(0);

        Ok(Allocation {
            offset: aligned,
            len: size,
        })
    }

    /// Allocates room for `bytes` and copies them in.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Allocation {
        let alloc = self.allocate(bytes.len());
        self.pages.as_mut_slice()[alloc.offset..alloc.end()].copy_from_slice(bytes);
        alloc
    }

    /// Resizes the most recent allocation to `new_size` bytes in place.
    ///
    /// Any bytes added are zeroed. `last` must be the allocation that starts
    /// at `previous`; nothing may have been allocated after it.
    pub fn grow_last(&mut self, last: Allocation, new_size: usize) -> Allocation {
        debug_assert_eq!(
            last.offset, self.previous,
            "grow_last: allocation is not the most recent one"
        );
        debug_assert_eq!(
            last.end(),
            self.current,
            "grow_last: region advanced past the allocation"
        );

        let start = self.previous;
        let old_end = self.current;
        let new_end = start + new_size;
        if let Err(e) = self.ensure_committed(new_end) {
            fatal(e);
        }
        if new_end > old_end {
            self.pages.as_mut_slice()[old_end..new_end].fill(0);
        }
        self.current = new_end;

        Allocation {
            offset: start,
            len: new_size,
        }
    }

    /// Snapshot of the allocation offsets.
    #[inline(always)]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            current: self.current,
            previous: self.previous,
        }
    }

    /// Rolls the region back to `checkpoint`.
    ///
    /// Every page strictly above the first page boundary at or after the
    /// restored offset is decommitted. The first page always stays committed.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        debug_assert!(
            checkpoint.current <= self.current,
            "restore: checkpoint is ahead of the region"
        );

        let keep = align_up(checkpoint.current, self.page_size).max(self.page_size);
        if keep < self.committed {
            let before = self.committed;
            if let Err(e) = self.pages.decommit(keep, before - keep) {
                fatal(e);
            }
            self.committed = keep;
            debug_assert!(self.committed < before);
        }

        self.current = checkpoint.current;
        self.previous = checkpoint.previous;
    }

    /// Resets the region to its freshly reserved state.
    #[inline]
    pub fn clear(&mut self) {
        self.restore(Checkpoint::default());
    }

    /// Bytes of an allocation.
    #[inline(always)]
    pub fn bytes(&self, alloc: Allocation) -> &[u8] {
        &self.pages.as_slice()[alloc.offset..alloc.end()]
    }

    /// Mutable bytes of an allocation.
    #[inline(always)]
    pub fn bytes_mut(&mut self, alloc: Allocation) -> &mut [u8] {
        &mut self.pages.as_mut_slice()[alloc.offset..alloc.end()]
    }

    fn ensure_committed(&mut self, end: usize) -> Result<(), RegionError> {
        if end <= self.committed {
            return Ok(());
        }
        if end > self.reserved {
            return Err(RegionError::Exhausted {
                requested: end,
                reserved: self.reserved,
            });
        }
        // TODO: commit in larger batches to cut syscalls on big documents.
        let target = align_up(end, self.page_size).min(self.reserved);
        self.pages.commit(self.committed, target - self.committed)?;
        self.committed = target;
        Ok(())
    }
}

/// Growable stack of `u32` values living in the last allocation of a region.
///
/// Holding the region mutably borrowed guarantees nothing else allocates
/// while the stack grows in place.
pub struct IdStack<'r, P: PageSource> {
    region: &'r mut Region<P>,
    alloc: Allocation,
    len: usize,
}

const ID_SIZE: usize = core::mem::size_of::<u32>();

impl<'r, P: PageSource> IdStack<'r, P> {
    /// Starts an empty stack at the top of `region`.
    pub fn new(region: &'r mut Region<P>) -> Self {
        let alloc = region.allocate(64 * ID_SIZE);
        Self {
            region,
            alloc,
            len: 0,
        }
    }

    /// Number of values on the stack.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the stack holds no values.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pushes a value, growing the backing allocation when full.
    pub fn push(&mut self, value: u32) {
        let at = self.len * ID_SIZE;
        if at + ID_SIZE > self.alloc.len() {
            self.alloc = self.region.grow_last(self.alloc, self.alloc.len() * 2);
        }
        self.region.bytes_mut(self.alloc)[at..at + ID_SIZE].copy_from_slice(&value.to_ne_bytes());
        self.len += 1;
    }

    /// Pops the most recently pushed value.
    pub fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let at = self.len * ID_SIZE;
        let mut raw = [0u8; ID_SIZE];
        raw.copy_from_slice(&self.region.bytes(self.alloc)[at..at + ID_SIZE]);
        Some(u32::from_ne_bytes(raw))
    }
}
