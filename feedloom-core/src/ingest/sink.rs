//! Persistence collaborator.

use std::sync::{Mutex, PoisonError};

use feedloom_types::{EntryRecord, FeedRecord};
use rustc_hash::FxHashMap;

/// Receives the records of each successfully ingested feed.
///
/// Called from worker threads, once per feed, with every entry that
/// survived extraction. Feeds arrive in no particular order across workers.
pub trait FeedSink: Send + Sync {
    fn store(&self, feed: &FeedRecord, entries: &[EntryRecord]);
}

#[derive(Default)]
struct Tables {
    feeds: FxHashMap<String, FeedRecord>,
    entries: FxHashMap<String, EntryRecord>,
}

/// In-memory sink keyed like a database would be: feeds by URL, entries by
/// link. Storing the same key again replaces the previous record.
#[derive(Default)]
pub struct MemorySink {
    tables: Mutex<Tables>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }

    pub fn feed(&self, url: &str) -> Option<FeedRecord> {
        self.with(|t| t.feeds.get(url).cloned())
    }

    pub fn entry(&self, link: &str) -> Option<EntryRecord> {
        self.with(|t| t.entries.get(link).cloned())
    }

    /// All feeds, sorted by URL.
    pub fn feeds(&self) -> Vec<FeedRecord> {
        let mut feeds: Vec<_> = self.with(|t| t.feeds.values().cloned().collect());
        feeds.sort_unstable_by(|a, b| a.url.cmp(&b.url));
        feeds
    }

    /// All entries, sorted by link.
    pub fn entries(&self) -> Vec<EntryRecord> {
        let mut entries: Vec<_> = self.with(|t| t.entries.values().cloned().collect());
        entries.sort_unstable_by(|a, b| a.link.cmp(&b.link));
        entries
    }

    pub fn feed_count(&self) -> usize {
        self.with(|t| t.feeds.len())
    }

    pub fn entry_count(&self) -> usize {
        self.with(|t| t.entries.len())
    }
}

impl FeedSink for MemorySink {
    fn store(&self, feed: &FeedRecord, entries: &[EntryRecord]) {
        self.with(|t| {
            t.feeds.insert(feed.url.clone(), feed.clone());
            for entry in entries {
                t.entries.insert(entry.link.clone(), entry.clone());
            }
        });
    }
}
