//! Fixed pool of long-lived worker threads.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use feedloom_types::{PipelineConfig, PoolError};

use super::fetch::Fetcher;
use super::queue::{WorkItem, WorkQueue};
use super::sink::FeedSink;
use super::stats::{Counters, IngestStats};
use super::worker::{ItemOutcome, WorkerContext};

/// Worker threads draining one shared queue.
///
/// The pool's owner is the only producer: [`enqueue`](Self::enqueue) takes
/// `&mut self`. Workers sleep while the queue is empty and exit once it is
/// closed and drained.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use feedloom_core::ingest::{FileFetcher, MemorySink, WorkerPool};
/// use feedloom_types::PipelineConfig;
///
/// let sink = Arc::new(MemorySink::new());
/// let mut pool = WorkerPool::spawn(
///     PipelineConfig::default(),
///     Arc::new(FileFetcher::new()),
///     sink.clone(),
/// )?;
/// pool.enqueue("feeds/news.xml");
/// let stats = pool.join();
/// println!("{}", stats);
/// # Ok::<(), feedloom_types::PoolError>(())
/// ```
pub struct WorkerPool {
    queue: Arc<WorkQueue>,
    counters: Arc<Counters>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Reserves every worker's regions, then starts the threads.
    ///
    /// Nothing is started if any reservation fails.
    pub fn spawn(
        config: PipelineConfig,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn FeedSink>,
    ) -> Result<Self, PoolError> {
        if config.workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let contexts = (0..config.workers)
            .map(|worker| {
                WorkerContext::new(worker, &config)
                    .map_err(|source| PoolError::Region { worker, source })
            })
            .collect::<Result<Vec<WorkerContext>, _>>()?;

        let mut pool = Self {
            queue: Arc::new(WorkQueue::new()),
            counters: Arc::new(Counters::default()),
            workers: Vec::with_capacity(config.workers),
        };

        for ctx in contexts {
            let worker = ctx.id();
            let queue = Arc::clone(&pool.queue);
            let counters = Arc::clone(&pool.counters);
            let fetcher = Arc::clone(&fetcher);
            let sink = Arc::clone(&sink);

            let handle = thread::Builder::new()
                .name(format!("feedloom-worker-{}", worker))
                .spawn(move || run(ctx, &queue, &*fetcher, &*sink, &counters))
                .map_err(|e| PoolError::Spawn {
                    worker,
                    reason: e.to_string(),
                })?;
            pool.workers.push(handle);
        }

        log::info!(target: "feedloom.ingest", "started {} workers", config.workers);
        Ok(pool)
    }

    /// Queues a feed URL. Returns false after [`close`](Self::close).
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        self.queue.push(WorkItem::new(url))
    }

    /// Stops accepting work. Queued items are still processed.
    pub fn close(&self) {
        self.queue.close();
    }

    /// Items not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Counters so far; workers may still be running.
    pub fn stats(&self) -> IngestStats {
        self.counters.snapshot()
    }

    /// Closes the queue, waits for every worker to drain it and exit, and
    /// returns the final counters.
    pub fn join(mut self) -> IngestStats {
        self.queue.close();
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                log::error!(target: "feedloom.ingest", "{} panicked", name);
            }
        }
        self.counters.snapshot()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Let detached workers exit instead of sleeping forever.
        self.queue.close();
    }
}

fn run(
    mut ctx: WorkerContext,
    queue: &WorkQueue,
    fetcher: &dyn Fetcher,
    sink: &dyn FeedSink,
    counters: &Counters,
) {
    while let Some(item) = queue.pop() {
        match ctx.process(&item, fetcher, sink) {
            ItemOutcome::Stored { entries, skipped } => counters.feed_ok(entries, skipped),
            ItemOutcome::Dropped => counters.feed_failed(),
        }
    }
    log::debug!(target: "feedloom.ingest", "worker {} exiting", ctx.id());
}
