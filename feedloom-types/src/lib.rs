//! Core types shared by the feedloom crates.
//!
//! This crate holds the plain value types that cross module and crate
//! boundaries: spans into documents, node handles, parsed timestamps, the
//! records handed to persistence, error values and pipeline configuration.
//! Keeping them here means:
//!
//! - **No algorithm code**: the parser, normalizer and pool live in `feedloom-core`
//! - **Cheap values**: almost everything is `Copy` and sized for tight packing
//! - **Clean boundaries**: collaborators (fetch, persistence) only need this crate

#![warn(missing_docs)]

use core::fmt;

/// Byte range inside a document.
///
/// Document offsets are stored as `u32`, which caps a single document at
/// 4 GiB. Feeds are orders of magnitude smaller than that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    offset: u32,
    len: u32,
}

impl Span {
    /// Creates a span from a start offset and a length.
    #[inline(always)]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Creates a span covering `start..end`.
    ///
    /// `end` is clamped so the span is never inverted. Offsets must fit in
    /// `u32`; callers bound document size accordingly.
    #[inline(always)]
    pub fn from_range(start: usize, end: usize) -> Self {
        let end = end.max(start);
        debug_assert!(end <= u32::MAX as usize, "span past 4 GiB");
        Self::new(start as u32, (end - start) as u32)
    }

    /// Returns the starting byte offset.
    #[inline(always)]
    pub const fn offset(self) -> usize {
        self.offset as usize
    }

    /// Returns the length in bytes.
    #[inline(always)]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    /// Returns the exclusive end offset.
    #[inline(always)]
    pub const fn end(self) -> usize {
        self.offset as usize + self.len as usize
    }

    /// Returns true if the span covers no bytes.
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns the span as a range usable for slicing.
    #[inline(always)]
    pub const fn range(self) -> core::ops::Range<usize> {
        self.offset()..self.end()
    }
}

/// Handle of a node inside a markup tree.
///
/// Nodes live in a vector owned by the tree; a `NodeId` is the index into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the index of this node in its tree's node vector.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kinds of structural problems the markup parser can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupErrorKind {
    /// Input ended in the middle of a construct.
    UnexpectedEof {
        /// What was being read when the input ran out.
        context: &'static str,
    },
    /// An opening tag had no name.
    MissingTagName,
    /// A byte that does not fit the grammar at this point.
    UnexpectedChar {
        /// The offending byte.
        found: u8,
        /// What was being read.
        context: &'static str,
    },
    /// An attribute name was not followed by `=`.
    MissingEquals,
    /// An attribute value did not start with `'` or `"`.
    MissingQuote,
    /// A closing tag appeared with no open element.
    UnbalancedClose,
    /// A second top-level element appeared after the root was closed.
    MultipleRoots,
}

impl MarkupErrorKind {
    /// Short human-readable description.
    pub fn message(&self) -> String {
        match self {
            MarkupErrorKind::UnexpectedEof { context } => {
                format!("unexpected end of input in {}", context)
            }
            MarkupErrorKind::MissingTagName => "expected a tag name".to_string(),
            MarkupErrorKind::UnexpectedChar { found, context } => {
                format!(
                    "unexpected character {:?} in {}",
                    char::from(*found),
                    context
                )
            }
            MarkupErrorKind::MissingEquals => "expected '=' after attribute name".to_string(),
            MarkupErrorKind::MissingQuote => "expected a quoted attribute value".to_string(),
            MarkupErrorKind::UnbalancedClose => "closing tag without an open element".to_string(),
            MarkupErrorKind::MultipleRoots => "more than one root element".to_string(),
        }
    }
}

/// A structural error recorded by the markup parser.
///
/// Errors are data: the parser appends them to the tree and keeps going as
/// far as it safely can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupError {
    /// What went wrong.
    pub kind: MarkupErrorKind,
    /// Byte offset in the input where the problem was detected.
    pub offset: usize,
}

impl MarkupError {
    /// Creates an error record.
    #[inline]
    pub const fn new(kind: MarkupErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// Human-readable message, without the offset.
    pub fn text(&self) -> String {
        self.kind.message()
    }
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.kind.message(), self.offset)
    }
}

impl core::error::Error for MarkupError {}

/// Calendar fields of a parsed date-time, as written in the input.
///
/// `month` is zero-based (January = 0). Values are not range-checked beyond
/// what the grammars enforce; odd values propagate into the epoch arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandedTime {
    /// Full year, e.g. 2023.
    pub year: i32,
    /// Zero-based month, 0..=11.
    pub month: u32,
    /// Day of month, 1-based.
    pub day: u32,
    /// Hour of day.
    pub hour: u32,
    /// Minute of hour.
    pub minute: u32,
    /// Second of minute.
    pub second: u32,
}

/// A normalized point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    /// Local wall-clock fields as written in the source string.
    pub expanded: ExpandedTime,
    /// Offset of the source zone from UTC, in seconds (east positive).
    pub offset_seconds: i32,
    /// Seconds since 1970-01-01T00:00:00Z.
    ///
    /// Instants before the epoch saturate to 0.
    pub unix_seconds: u64,
}

/// The two date-time grammars the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGrammar {
    /// `[Day, ] DD Mon YYYY HH:MM[:SS] ZONE`
    Rfc822,
    /// `YYYY-MM-DDTHH:MM:SS[.fraction]ZONE`
    Rfc3339,
}

impl fmt::Display for DateGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateGrammar::Rfc822 => write!(f, "RFC 822"),
            DateGrammar::Rfc3339 => write!(f, "RFC 3339"),
        }
    }
}

/// What a date-time grammar tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateErrorKind {
    /// The input was empty.
    Empty,
    /// A numeric field contained a non-digit or no digits at all.
    ExpectedDigit {
        /// Name of the field being scanned.
        field: &'static str,
    },
    /// A required delimiter never appeared.
    MissingDelimiter {
        /// The delimiter that was expected.
        delimiter: char,
        /// Name of the field it terminates.
        field: &'static str,
    },
    /// The weekday was not one of `Sun`..`Sat`.
    UnknownWeekday,
    /// The month was not one of `Jan`..`Dec`.
    UnknownMonth,
    /// The timezone token matched neither a numeric offset nor a named zone.
    UnknownZone,
}

impl fmt::Display for DateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateErrorKind::Empty => write!(f, "empty date-time"),
            DateErrorKind::ExpectedDigit { field } => write!(f, "expected digits in {}", field),
            DateErrorKind::MissingDelimiter { delimiter, field } => {
                write!(f, "expected {:?} after {}", delimiter, field)
            }
            DateErrorKind::UnknownWeekday => write!(f, "unknown weekday name"),
            DateErrorKind::UnknownMonth => write!(f, "unknown month name"),
            DateErrorKind::UnknownZone => write!(f, "unknown timezone"),
        }
    }
}

/// Failure to parse a date-time string.
///
/// Carries the grammar that got furthest and how far it got; when both
/// grammars fail, the one with more progress is assumed to be the intended
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeError {
    /// Grammar that produced this error.
    pub grammar: DateGrammar,
    /// The first problem found.
    pub kind: DateErrorKind,
    /// Byte offset of the first problem.
    pub position: usize,
    /// How far the grammar's cursor advanced before giving up.
    pub progress: usize,
}

impl fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at byte {}",
            self.grammar, self.kind, self.position
        )
    }
}

impl core::error::Error for DateTimeError {}

/// Errors from the region allocator's platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// The address range could not be reserved.
    Reserve {
        /// Requested reservation size.
        bytes: usize,
        /// Platform error text.
        reason: String,
    },
    /// Pages could not be committed or decommitted.
    Commit {
        /// Start of the affected range.
        offset: usize,
        /// Length of the affected range.
        len: usize,
        /// Platform error text.
        reason: String,
    },
    /// The reservation is too small for the request.
    Exhausted {
        /// Bytes the region would need in total.
        requested: usize,
        /// Bytes reserved.
        reserved: usize,
    },
    /// Configuration values the allocator cannot work with.
    InvalidConfig {
        /// Which value was wrong.
        reason: &'static str,
    },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::Reserve { bytes, reason } => {
                write!(f, "failed to reserve {} bytes: {}", bytes, reason)
            }
            RegionError::Commit {
                offset,
                len,
                reason,
            } => {
                write!(
                    f,
                    "failed to change commitment of {} bytes at offset {}: {}",
                    len, offset, reason
                )
            }
            RegionError::Exhausted {
                requested,
                reserved,
            } => {
                write!(
                    f,
                    "region exhausted: {} bytes needed, {} reserved",
                    requested, reserved
                )
            }
            RegionError::InvalidConfig { reason } => {
                write!(f, "invalid region configuration: {}", reason)
            }
        }
    }
}

impl core::error::Error for RegionError {}

/// Failure reported by the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    /// URL that was requested.
    pub url: String,
    /// Transport error text.
    pub reason: String,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch {} failed: {}", self.url, self.reason)
    }
}

impl core::error::Error for FetchError {}

/// Failure to start a worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A worker's region could not be reserved.
    Region {
        /// Index of the worker being set up.
        worker: usize,
        /// The allocator's error.
        source: RegionError,
    },
    /// The OS refused to start a worker thread.
    Spawn {
        /// Index of the worker being started.
        worker: usize,
        /// OS error text.
        reason: String,
    },
    /// A pool needs at least one worker.
    NoWorkers,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Region { worker, source } => {
                write!(f, "worker {}: {}", worker, source)
            }
            PoolError::Spawn { worker, reason } => {
                write!(f, "failed to start worker {}: {}", worker, reason)
            }
            PoolError::NoWorkers => write!(f, "pool configured with zero workers"),
        }
    }
}

impl core::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            PoolError::Region { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A successfully parsed feed, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedRecord {
    /// URL the feed was fetched from.
    pub url: String,
    /// Decoded feed title.
    pub title: String,
}

/// One feed entry, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryRecord {
    /// Link to the entry's web page.
    pub link: String,
    /// Entry title; empty when the entry has none.
    pub title: String,
    /// Publication time in seconds since the epoch.
    pub published: u64,
    /// URL of the feed this entry belongs to.
    pub feed_url: String,
}

/// Sizing of one allocator region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionConfig {
    /// Address space reserved up front. Never exceeded.
    pub reserve_bytes: usize,
    /// Commit granularity. Must be a power of two.
    pub page_size: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            reserve_bytes: 1 << 30,
            page_size: 64 * 1024,
        }
    }
}

impl RegionConfig {
    /// A 16 MiB reservation with 4 KiB pages, for tests and tools.
    pub const fn small() -> Self {
        Self {
            reserve_bytes: 16 << 20,
            page_size: 4096,
        }
    }
}

/// What a worker does with its persistent region between items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistPolicy {
    /// Checkpoint before each item and restore once its records are emitted.
    #[default]
    ReclaimPerItem,
    /// Keep every fetched document for the worker's lifetime.
    ///
    /// Memory grows with every feed processed; only useful when something
    /// outside the pipeline reads the region afterwards.
    RetainAll,
}

/// Pipeline configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Sizing of each worker's scratch and persistent regions.
    pub region: RegionConfig,
    /// Lifetime of data in the persistent region.
    pub persist: PersistPolicy,
    /// Fetched documents larger than this are skipped.
    pub max_document_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            workers: cores.saturating_sub(1).max(1),
            region: RegionConfig::default(),
            persist: PersistPolicy::ReclaimPerItem,
            max_document_bytes: 32 << 20,
        }
    }
}

impl PipelineConfig {
    /// A single worker with small regions. Deterministic ordering, cheap to start.
    pub const fn single_worker() -> Self {
        Self {
            workers: 1,
            region: RegionConfig::small(),
            persist: PersistPolicy::ReclaimPerItem,
            max_document_bytes: 8 << 20,
        }
    }
}
