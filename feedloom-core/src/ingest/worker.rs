//! Per-worker state and the fetch → parse → extract → emit sequence.

use feedloom_types::{PersistPolicy, PipelineConfig, RegionError};

use super::extract::extract_feed;
use super::fetch::Fetcher;
use super::queue::WorkItem;
use super::sink::FeedSink;
use crate::markup;
use crate::region::{fatal, PageSource, Region, VirtualPages};

const TARGET: &str = "feedloom.ingest";

/// What happened to one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The feed and its surviving entries reached the sink.
    Stored { entries: u64, skipped: u64 },
    /// Nothing was stored; the reason was logged.
    Dropped,
}

const MAX_SPAN_BYTES: usize = u32::MAX as usize;

/// Everything one worker owns.
///
/// The scratch region holds lookup stacks and is cleared after every item.
/// The persistent region holds fetched documents; whether they outlive
/// their item is decided by [`PersistPolicy`].
pub struct WorkerContext<P: PageSource = VirtualPages> {
    id: usize,
    scratch: Region<P>,
    persistent: Region<P>,
    persist: PersistPolicy,
    max_document_bytes: usize,
}

impl<P: PageSource> WorkerContext<P> {
    /// Reserves both regions.
    ///
    /// The document limit is capped at `u32::MAX` bytes, the widest source
    /// a [`Span`](feedloom_types::Span) can address.
    pub fn new(id: usize, config: &PipelineConfig) -> Result<Self, RegionError> {
        Ok(Self {
            id,
            scratch: Region::reserve_with(config.region)?,
            persistent: Region::reserve_with(config.region)?,
            persist: config.persist,
            max_document_bytes: config.max_document_bytes.min(MAX_SPAN_BYTES),
        })
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn scratch(&self) -> &Region<P> {
        &self.scratch
    }

    pub fn persistent(&self) -> &Region<P> {
        &self.persistent
    }

    /// Runs one item to completion and resets the scratch region.
    pub fn process(
        &mut self,
        item: &WorkItem,
        fetcher: &dyn Fetcher,
        sink: &dyn FeedSink,
    ) -> ItemOutcome {
        log::debug!(target: TARGET, "worker {}: {}", self.id, item.url);

        let outcome = match self.persist {
            PersistPolicy::ReclaimPerItem => {
                let checkpoint = self.persistent.checkpoint();
                let outcome = self.ingest(&item.url, fetcher, sink);
                self.persistent.restore(checkpoint);
                outcome
            }
            PersistPolicy::RetainAll => self.ingest(&item.url, fetcher, sink),
        };

        self.scratch.clear();
        outcome
    }

    fn ingest(&mut self, url: &str, fetcher: &dyn Fetcher, sink: &dyn FeedSink) -> ItemOutcome {
        let raw = match fetcher.fetch(url) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!(target: TARGET, "{}", e);
                return ItemOutcome::Dropped;
            }
        };
        if raw.is_empty() {
            log::warn!(target: TARGET, "{}: empty document", url);
            return ItemOutcome::Dropped;
        }
        if raw.len() > self.max_document_bytes {
            log::warn!(
                target: TARGET,
                "{}: document is {} bytes, limit is {}",
                url,
                raw.len(),
                self.max_document_bytes
            );
            return ItemOutcome::Dropped;
        }

        let doc = match self.persistent.try_allocate(raw.len()) {
            Ok(doc) => doc,
            Err(e @ RegionError::Exhausted { .. }) => {
                log::error!(target: TARGET, "{}: {}", url, e);
                return ItemOutcome::Dropped;
            }
            Err(e) => fatal(e),
        };
        self.persistent.bytes_mut(doc).copy_from_slice(&raw);
        drop(raw);

        let mut tree = markup::parse(self.persistent.bytes(doc));
        tree.locate_feed(&mut self.scratch);
        if tree.open_depth() > 0 {
            log::debug!(
                target: TARGET,
                "{}: {} elements left open",
                url,
                tree.open_depth()
            );
        }

        let extracted = match extract_feed(&tree, url) {
            Ok(extracted) => extracted,
            Err(reason) => {
                log::warn!(target: TARGET, "{}: dropping feed: {}", url, reason);
                return ItemOutcome::Dropped;
            }
        };

        sink.store(&extracted.feed, &extracted.entries);
        log::debug!(
            target: TARGET,
            "{}: stored {:?} with {} entries",
            url,
            extracted.feed.title,
            extracted.entries.len()
        );

        ItemOutcome::Stored {
            entries: extracted.entries.len() as u64,
            skipped: extracted.skipped,
        }
    }
}
