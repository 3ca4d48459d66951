//! Pool counters and IngestStats.

use std::sync::atomic::{AtomicU64, Ordering};

/// A snapshot of what a pool has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Feeds whose records reached the sink.
    pub feeds_ok: u64,
    /// Feeds dropped: fetch failure, oversized, malformed or untitled.
    pub feeds_failed: u64,
    /// Entries handed to the sink.
    pub entries_emitted: u64,
    /// Entries dropped for a missing link or an unusable date.
    pub entries_skipped: u64,
}

impl IngestStats {
    /// Feeds taken off the queue.
    pub fn feeds_seen(&self) -> u64 {
        self.feeds_ok + self.feeds_failed
    }
}

impl core::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} feeds ({} ok, {} failed), {} entries ({} skipped)",
            self.feeds_seen(),
            self.feeds_ok,
            self.feeds_failed,
            self.entries_emitted,
            self.entries_skipped
        )
    }
}

/// Shared counters updated by every worker.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    feeds_ok: AtomicU64,
    feeds_failed: AtomicU64,
    entries_emitted: AtomicU64,
    entries_skipped: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn feed_ok(&self, entries: u64, skipped: u64) {
        self.feeds_ok.fetch_add(1, Ordering::Relaxed);
        self.entries_emitted.fetch_add(entries, Ordering::Relaxed);
        self.entries_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn feed_failed(&self) {
        self.feeds_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> IngestStats {
        IngestStats {
            feeds_ok: self.feeds_ok.load(Ordering::Relaxed),
            feeds_failed: self.feeds_failed.load(Ordering::Relaxed),
            entries_emitted: self.entries_emitted.load(Ordering::Relaxed),
            entries_skipped: self.entries_skipped.load(Ordering::Relaxed),
        }
    }
}
