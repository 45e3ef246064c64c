use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use tokio::{runtime::Handle, sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    config::{BatchBounds, BatchConfig},
    executor::BatchExecutor,
    job::{Job, JobResult},
    pending::{PendingResult, ResultSender, pending_pair},
    queue::JobQueue,
};

/// Lifecycle of a [`MicroBatcher`].
///
/// Transitions only go forward, `Running -> ShuttingDown -> Stopped`, and only
/// [`MicroBatcher::shutdown`] triggers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherState {
    /// The drain loop is scheduled and submissions are accepted
    Running,
    /// No further periodic drain will be scheduled
    ShuttingDown,
    /// The final drain has completed
    Stopped,
}

impl BatcherState {
    fn as_u8(self) -> u8 {
        match self {
            BatcherState::Running => 0,
            BatcherState::ShuttingDown => 1,
            BatcherState::Stopped => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => BatcherState::Running,
            1 => BatcherState::ShuttingDown,
            _ => BatcherState::Stopped,
        }
    }
}

/// Snapshot of the batcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatcherStats {
    /// Jobs accepted into the queue
    pub submitted: usize,
    /// Jobs refused because the batcher was already shut down
    pub rejected: usize,
    /// Executor invocations
    pub batches: usize,
    /// Jobs resolved with a successful result
    pub succeeded: usize,
    /// Jobs resolved with a failed result
    pub failed: usize,
    /// Jobs waiting in the queue when the snapshot was taken
    pub pending: usize,
}

/// Timing record returned by [`MicroBatcher::shutdown`].
#[derive(Debug)]
pub struct BatcherExecution {
    /// The time when the batcher started its drain loop
    pub start: Instant,
    /// The time when the shutdown completed
    pub end: Instant,
    /// How long the batcher was alive
    pub duration: Duration,
    /// Counters at the end of the shutdown
    pub stats: BatcherStats,
}

struct QueueEntry {
    job: Arc<dyn Job>,
    sender: ResultSender,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    rejected: AtomicUsize,
    batches: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// State shared between the public handle and the drain loop task.
struct Shared {
    id: Uuid,
    name: String,
    config: BatchConfig,
    executor: Arc<dyn BatchExecutor>,
    queue: JobQueue<QueueEntry>,
    state: AtomicU8,
    cancel: CancellationToken,
    counters: Counters,
}

impl Shared {
    fn state(&self) -> BatcherState {
        BatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: BatcherState, to: BatcherState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Hands `entries` to the executor and resolves every pending result.
    async fn process(&self, entries: Vec<QueueEntry>) {
        let expected = entries.len();
        let jobs: Vec<Arc<dyn Job>> = entries
            .iter()
            .map(|entry| Arc::clone(&entry.job))
            .collect();

        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        debug!("Processing batch of {} job(s) on batcher {}", expected, self.name);

        // The executor runs in its own task so that a panic fails this batch
        // instead of killing the drain loop.
        let executor = Arc::clone(&self.executor);
        let outcome = tokio::spawn(async move { executor.process_batch(&jobs).await }).await;

        let results = match outcome {
            Ok(results) => reconcile(results, expected),
            Err(join_error) => {
                error!("Batch executor failed on batcher {}: {}", self.name, join_error);
                let message = format!("batch executor failed: {}", join_error);
                vec![JobResult::failure(message); expected]
            }
        };

        for (entry, result) in entries.into_iter().zip(results) {
            if result.success {
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
            } else {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            let id = entry.sender.id();
            if !entry.sender.resolve(result) {
                debug!("Result of job {} discarded, caller stopped waiting", id);
            }
        }
    }

    fn stats(&self) -> BatcherStats {
        BatcherStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            batches: self.counters.batches.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            pending: self.queue.len(),
        }
    }
}

/// Aligns executor output with the submitted jobs: missing results become
/// failures, surplus results are dropped.
fn reconcile(mut results: Vec<JobResult>, expected: usize) -> Vec<JobResult> {
    if results.len() < expected {
        warn!(
            "Batch executor returned {} result(s) for {} job(s), failing the rest",
            results.len(),
            expected
        );
        let missing = format!(
            "batch executor returned no result for this job ({} of {} results)",
            results.len(),
            expected
        );
        results.resize(expected, JobResult::failure(missing));
    } else if results.len() > expected {
        warn!(
            "Batch executor returned {} result(s) for {} job(s), discarding the surplus",
            results.len(),
            expected
        );
        results.truncate(expected);
    }
    results
}

/// Periodic drain: wait one interval, take up to `batch_size` entries, run them.
///
/// Only one batch is in flight at a time; the next wait starts after the
/// previous batch has been resolved.
async fn drain_loop(shared: Arc<Shared>) {
    let interval = shared.config.batch_interval();
    let batch_size = shared.config.batch_size;

    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let entries = shared.queue.drain_up_to(batch_size);
        if entries.is_empty() {
            continue;
        }
        shared.process(entries).await;
    }

    debug!("Drain loop of batcher {} stopped", shared.name);
}

/// Groups individually submitted jobs into batches.
///
/// Every `batch_interval_millis` the batcher takes up to `batch_size` jobs from
/// its queue, in submission order, and hands them to its [`BatchExecutor`].
/// Each caller gets a [`PendingResult`] right away, resolved once its batch has
/// run.
///
/// A batch never fires early when it is full: the size only bounds how many
/// jobs one tick takes.
///
/// # Example
///
/// ```
/// use micro_batch_rs::{
///     core::{batcher::MicroBatcherBuilder, job::{FnJob, JobResult}},
///     executor::sequential::SequentialExecutor,
/// };
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), micro_batch_rs::BatchError> {
/// let batcher = MicroBatcherBuilder::new()
///     .executor(SequentialExecutor::new())
///     .batch_size(10)
///     .batch_interval_millis(50)
///     .build()?;
///
/// let pending = batcher.submit(FnJob::new(|| async {
///     Ok::<_, micro_batch_rs::BatchError>(JobResult::success("5"))
/// }));
/// let result = pending.await?;
/// assert_eq!(result.message, "5");
///
/// batcher.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct MicroBatcher {
    shared: Arc<Shared>,
    start: Instant,
    background: Mutex<Background>,
}

/// Tasks a shutdown has to wait for. A slot is cleared only once its task has
/// been joined.
struct Background {
    drain_loop: Option<JoinHandle<()>>,
    final_drain: Option<JoinHandle<()>>,
}

impl MicroBatcher {
    /// Creates a batcher with the default configuration (3 jobs, 100ms).
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(executor: impl BatchExecutor + 'static) -> Result<Self, BatchError> {
        MicroBatcherBuilder::new().executor(executor).build()
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &BatchConfig {
        &self.shared.config
    }

    pub fn state(&self) -> BatcherState {
        self.shared.state()
    }

    pub fn stats(&self) -> BatcherStats {
        self.shared.stats()
    }

    /// Queues `job` and returns a handle on its future result.
    ///
    /// Never waits for the batch to run. A job submitted after the shutdown has
    /// closed the queue is not executed: its result is resolved at once as a
    /// failure.
    pub fn submit(&self, job: impl Job + 'static) -> PendingResult {
        self.submit_shared(Arc::new(job))
    }

    /// Same as [`submit`](MicroBatcher::submit) for a job that is already shared.
    pub fn submit_shared(&self, job: Arc<dyn Job>) -> PendingResult {
        let (sender, pending) = pending_pair();
        let id = sender.id();

        match self.shared.queue.enqueue(QueueEntry { job, sender }) {
            Ok(()) => {
                self.shared.counters.submitted.fetch_add(1, Ordering::Relaxed);
                debug!("Job {} queued on batcher {}", id, self.shared.name);
            }
            Err(rejected) => {
                self.shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Job {} submitted to batcher {} after shutdown, rejecting it",
                    id, self.shared.name
                );
                rejected
                    .sender
                    .resolve(JobResult::failure("batcher is shut down"));
            }
        }

        pending
    }

    /// Stops the batcher and resolves every job still queued.
    ///
    /// In order: no further tick is scheduled, the tick in flight (if any) is
    /// awaited, then all remaining jobs are run in one final batch regardless
    /// of the batch size. Calling it again, or concurrently, waits for the first
    /// shutdown and then returns without doing anything.
    ///
    /// Dropping the returned future (for instance on a timeout) loses no job:
    /// the tick in flight and the final batch keep running in their own tasks,
    /// and the next call to `shutdown` waits for them.
    pub async fn shutdown(&self) -> BatcherExecution {
        let mut background = self.background.lock().await;

        if self
            .shared
            .transition(BatcherState::Running, BatcherState::ShuttingDown)
        {
            info!("Stopping batcher: {}, id: {}", self.shared.name, self.shared.id);
        }

        self.shared.cancel.cancel();
        if let Some(handle) = background.drain_loop.as_mut() {
            let outcome = handle.await;
            background.drain_loop = None;
            if let Err(join_error) = outcome {
                error!(
                    "Drain loop of batcher {} failed: {}",
                    self.shared.name, join_error
                );
            }
        }

        // A closed queue means the final drain has already been started.
        if !self.shared.queue.is_closed() {
            let remaining = self.shared.queue.close_and_drain();
            if !remaining.is_empty() {
                debug!(
                    "Final drain of {} job(s) on batcher {}",
                    remaining.len(),
                    self.shared.name
                );
                let shared = Arc::clone(&self.shared);
                background.final_drain =
                    Some(tokio::spawn(async move { shared.process(remaining).await }));
            }
        }

        if let Some(handle) = background.final_drain.as_mut() {
            let outcome = handle.await;
            background.final_drain = None;
            if let Err(join_error) = outcome {
                error!(
                    "Final drain of batcher {} failed: {}",
                    self.shared.name, join_error
                );
            }
        }

        if self
            .shared
            .transition(BatcherState::ShuttingDown, BatcherState::Stopped)
        {
            info!("Batcher stopped: {}, id: {}", self.shared.name, self.shared.id);
        }

        BatcherExecution {
            start: self.start,
            end: Instant::now(),
            duration: self.start.elapsed(),
            stats: self.shared.stats(),
        }
    }
}

impl Drop for MicroBatcher {
    fn drop(&mut self) {
        if self.shared.state() == BatcherState::Running {
            warn!(
                "Batcher {} dropped without shutdown, {} queued job(s) will not run",
                self.shared.name,
                self.shared.queue.len()
            );
            self.shared.queue.close();
            self.shared.cancel.cancel();
        }
    }
}

/// Builder for creating a [`MicroBatcher`].
///
/// ```
/// use micro_batch_rs::core::batcher::MicroBatcherBuilder;
/// use micro_batch_rs::executor::parallel::ParallelExecutor;
///
/// # #[tokio::main]
/// # async fn main() {
/// let batcher = MicroBatcherBuilder::new()
///     .name("ingest".to_string())
///     .executor(ParallelExecutor::new())
///     .batch_size(50)
///     .batch_interval_millis(20)
///     .build()
///     .unwrap();
/// assert_eq!(batcher.name(), "ingest");
/// # }
/// ```
#[derive(Default)]
pub struct MicroBatcherBuilder {
    name: Option<String>,
    executor: Option<Arc<dyn BatchExecutor>>,
    config: BatchConfig,
    bounds: BatchBounds,
}

impl MicroBatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name used in log lines (generated randomly if not specified).
    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn executor(mut self, executor: impl BatchExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn batch_interval_millis(mut self, batch_interval_millis: u64) -> Self {
        self.config.batch_interval_millis = batch_interval_millis;
        self
    }

    /// Replaces both batching parameters at once.
    pub fn config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the limits the configuration is validated against.
    pub fn bounds(mut self, bounds: BatchBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Validates the configuration, then starts the drain loop.
    ///
    /// # Errors
    /// - `InvalidBatchSize` / `InvalidBatchInterval` / `InvalidBounds` when the
    ///   configuration is rejected; nothing is started in that case.
    /// - `Config` when no executor was provided.
    /// - `Runtime` when called outside a tokio runtime.
    pub fn build(self) -> Result<MicroBatcher, BatchError> {
        self.config.validate(&self.bounds)?;

        let executor = self
            .executor
            .ok_or_else(|| BatchError::Config("a batch executor is required".to_string()))?;

        let runtime = Handle::try_current().map_err(|error| BatchError::Runtime(error.to_string()))?;

        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            config: self.config,
            executor,
            queue: JobQueue::new(),
            state: AtomicU8::new(BatcherState::Running.as_u8()),
            cancel: CancellationToken::new(),
            counters: Counters::default(),
        });

        info!(
            "Start of batcher: {}, id: {}, batch size: {}, interval: {}ms",
            shared.name, shared.id, shared.config.batch_size, shared.config.batch_interval_millis
        );

        let handle = runtime.spawn(drain_loop(Arc::clone(&shared)));

        Ok(MicroBatcher {
            shared,
            start: Instant::now(),
            background: Mutex::new(Background {
                drain_loop: Some(handle),
                final_drain: None,
            }),
        })
    }
}
