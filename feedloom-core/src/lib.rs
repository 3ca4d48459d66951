//! Feed ingestion core.
//!
//! Fetches RSS and Atom documents, parses them into markup trees, normalizes
//! entry dates and hands the results to a persistence collaborator, on a
//! fixed pool of worker threads.
//!
//! ## Modules
//!
//! - [`region`]: bump allocator over reserved address space, with checkpoints
//! - [`markup`]: error-tolerant markup parser and tree lookups
//! - [`datetime`]: RFC 822 / RFC 3339 parsing to Unix seconds
//! - [`ingest`]: work queue, worker pool and the per-item pipeline
//!
//! Shared value types, errors and configuration live in `feedloom-types`.

pub mod datetime;
pub mod ingest;
pub mod markup;
pub mod region;

pub use datetime::{is_leap_year, parse_date_time};
pub use ingest::{FeedSink, Fetcher, IngestStats, WorkerPool};
pub use markup::{parse, MarkupTree};
pub use region::Region;
