//! Work Queue & Worker Pool
//!
//! One producer enqueues feed URLs; a fixed set of worker threads takes them
//! off a shared FIFO and runs each through:
//!
//! ```text
//! fetch ──► persistent region ──► parse ──► locate title/items ──► extract ──► sink
//!                                              (scratch region)
//! ```
//!
//! Every worker owns its two regions outright, so the allocator needs no
//! locking. Fetching and persistence are collaborators behind the
//! [`Fetcher`] and [`FeedSink`] traits.

pub mod extract;
mod fetch;
mod pool;
mod queue;
mod sink;
mod stats;
mod worker;

pub use extract::{extract_entry, extract_feed, EntrySkip, ExtractedFeed, FeedRejection, DATE_KEYS};
pub use fetch::{Fetcher, FileFetcher};
pub use pool::WorkerPool;
pub use queue::{WorkItem, WorkQueue};
pub use sink::{FeedSink, MemorySink};
pub use stats::IngestStats;
pub use worker::{ItemOutcome, WorkerContext};
