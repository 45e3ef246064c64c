mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::Result;
use async_trait::async_trait;

use common::{MockExecutor, RecordingExecutor, init_logger};
use micro_batch_rs::{
    BatchError, BatchExecutor, BatcherState, Job, JobResult, MicroBatcher, MicroBatcherBuilder,
    executor::{parallel::ParallelExecutor, sequential::SequentialExecutor},
    job::{AddJob, DelayJob, FailingJob},
};

#[tokio::test]
async fn construction_fails_outside_bounds() {
    for batch_size in [0, 1, 2, 1000, 1001, 5000] {
        let result = MicroBatcherBuilder::new()
            .executor(SequentialExecutor::new())
            .batch_size(batch_size)
            .build();
        assert!(
            matches!(result, Err(BatchError::InvalidBatchSize { value, .. }) if value == batch_size),
            "batch size {} should be rejected",
            batch_size
        );
    }

    for millis in [0, 10, 600_000, 1_000_000] {
        let result = MicroBatcherBuilder::new()
            .executor(SequentialExecutor::new())
            .batch_interval_millis(millis)
            .build();
        assert!(
            matches!(result, Err(BatchError::InvalidBatchInterval { value, .. }) if value == millis),
            "interval {}ms should be rejected",
            millis
        );
    }
}

#[tokio::test]
async fn default_batcher_starts_running() {
    let batcher = MicroBatcher::new(SequentialExecutor::new()).unwrap();

    assert_eq!(batcher.state(), BatcherState::Running);
    assert_eq!(batcher.config().batch_size, 3);
    assert_eq!(batcher.config().batch_interval_millis, 100);

    batcher.shutdown().await;
}

#[tokio::test]
async fn single_job_yields_its_result() -> Result<()> {
    init_logger();
    let batcher = MicroBatcher::new(SequentialExecutor::new())?;

    let result = batcher.submit(AddJob::new(2, 3)).await?;

    assert_eq!(result, JobResult::success("5"));
    batcher.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_batch_resolves_after_one_interval() -> Result<()> {
    let batcher = MicroBatcherBuilder::new()
        .executor(SequentialExecutor::new())
        .batch_size(10)
        .batch_interval_millis(100)
        .build()?;

    let start = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(2), batcher.submit(AddJob::new(1, 1)))
        .await??;

    assert_eq!(result.message, "2");
    assert!(start.elapsed() >= Duration::from_millis(50));
    batcher.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn full_batch_goes_first_then_remainder_on_next_tick() -> Result<()> {
    let batcher = MicroBatcherBuilder::new()
        .executor(SequentialExecutor::new())
        .batch_size(3)
        .batch_interval_millis(100)
        .build()?;

    let start = Instant::now();
    let pending: Vec<_> = (0..5).map(|i| batcher.submit(AddJob::new(i, 0))).collect();
    let mut pending = pending.into_iter();

    for i in 0..3 {
        let result = pending.next().unwrap().await?;
        assert_eq!(result.message, i.to_string());
    }
    let first_tick = start.elapsed();

    for i in 3..5 {
        let result = pending.next().unwrap().await?;
        assert_eq!(result.message, i.to_string());
    }
    let second_tick = start.elapsed();

    assert!(first_tick < Duration::from_millis(150), "{:?}", first_tick);
    assert!(second_tick >= Duration::from_millis(150), "{:?}", second_tick);
    assert_eq!(batcher.stats().batches, 2);

    batcher.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_executor_runs_batch_concurrently() -> Result<()> {
    let batcher = MicroBatcherBuilder::new()
        .executor(ParallelExecutor::new())
        .batch_size(25)
        .batch_interval_millis(50)
        .build()?;

    let start = Instant::now();
    let pending: Vec<_> = (0..20)
        .map(|i| batcher.submit(DelayJob::new(Duration::from_millis(100), format!("job-{}", i))))
        .collect();

    for (i, pending) in pending.into_iter().enumerate() {
        assert_eq!(pending.await?, JobResult::success(format!("job-{}", i)));
    }

    assert!(start.elapsed() < Duration::from_millis(1000));
    batcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn failing_job_does_not_affect_siblings() -> Result<()> {
    let batcher = MicroBatcherBuilder::new()
        .executor(SequentialExecutor::new())
        .batch_size(10)
        .batch_interval_millis(20)
        .build()?;

    let pending: Vec<_> = (0..5)
        .map(|i| {
            if i == 2 {
                batcher.submit(FailingJob::new("boom"))
            } else {
                batcher.submit(AddJob::new(i, 10))
            }
        })
        .collect();

    let mut results = Vec::new();
    for pending in pending {
        results.push(pending.await?);
    }

    assert_eq!(results.iter().filter(|r| !r.success).count(), 1);
    assert_eq!(results[2], JobResult::failure("Job from: boom"));
    for i in [0, 1, 3, 4] {
        assert_eq!(results[i], JobResult::success((i + 10).to_string()));
    }

    let stats = batcher.shutdown().await.stats;
    assert_eq!(stats.succeeded, 4);
    assert_eq!(stats.failed, 1);
    Ok(())
}

#[tokio::test]
async fn batches_follow_submission_order_and_size_limit() -> Result<()> {
    let executor = RecordingExecutor::default();
    let batcher = MicroBatcherBuilder::new()
        .executor(executor.clone())
        .batch_size(4)
        .batch_interval_millis(20)
        .build()?;

    let pending: Vec<_> = (0..10).map(|i| batcher.submit(AddJob::new(i, 0))).collect();
    for pending in pending {
        pending.await?;
    }
    batcher.shutdown().await;

    let batches = executor.batches();
    assert!(batches.iter().all(|batch| !batch.is_empty() && batch.len() <= 4));
    let flattened: Vec<String> = batches.into_iter().flatten().collect();
    let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    assert_eq!(flattened, expected);
    Ok(())
}

#[tokio::test]
async fn missing_executor_results_become_failures() -> Result<()> {
    let mut executor = MockExecutor::new();
    executor
        .expect_process_batch()
        .times(1)
        .returning(|_jobs| vec![JobResult::success("only one")]);

    let batcher = MicroBatcherBuilder::new()
        .executor(executor)
        .batch_size(5)
        .batch_interval_millis(20)
        .build()?;

    let first = batcher.submit(AddJob::new(1, 1));
    let second = batcher.submit(AddJob::new(2, 2));
    let third = batcher.submit(AddJob::new(3, 3));

    assert_eq!(first.await?, JobResult::success("only one"));
    let second = second.await?;
    assert!(!second.success);
    assert!(second.message.contains("no result"));
    assert!(!third.await?.success);

    batcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn surplus_executor_results_are_discarded() -> Result<()> {
    let mut executor = MockExecutor::new();
    executor.expect_process_batch().returning(|jobs| {
        (0..jobs.len() + 2)
            .map(|i| JobResult::success(i.to_string()))
            .collect()
    });

    let batcher = MicroBatcherBuilder::new()
        .executor(executor)
        .batch_interval_millis(20)
        .build()?;

    assert_eq!(batcher.submit(AddJob::new(0, 0)).await?, JobResult::success("0"));

    let stats = batcher.shutdown().await.stats;
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 0);
    Ok(())
}

/// Panics on its first batch, then answers every job with "recovered".
struct CrashOnceExecutor {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl BatchExecutor for CrashOnceExecutor {
    async fn process_batch(&self, jobs: &[Arc<dyn Job>]) -> Vec<JobResult> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("executor crashed");
        }
        vec![JobResult::success("recovered"); jobs.len()]
    }
}

#[tokio::test]
async fn panicking_executor_fails_its_batch_only() -> Result<()> {
    init_logger();
    let calls = Arc::new(AtomicUsize::new(0));

    let batcher = MicroBatcherBuilder::new()
        .executor(CrashOnceExecutor {
            calls: Arc::clone(&calls),
        })
        .batch_interval_millis(20)
        .build()?;

    let crashed = batcher.submit(AddJob::new(1, 2)).await?;
    assert!(!crashed.success);
    assert!(crashed.message.contains("batch executor failed"));

    let after = batcher.submit(AddJob::new(1, 2)).await?;
    assert_eq!(after, JobResult::success("recovered"));
    assert_eq!(batcher.state(), BatcherState::Running);

    batcher.shutdown().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn shared_jobs_can_be_submitted() -> Result<()> {
    let batcher = MicroBatcherBuilder::new()
        .executor(SequentialExecutor::new())
        .batch_interval_millis(20)
        .build()?;

    let job: Arc<dyn Job> = Arc::new(AddJob::new(20, 22));
    let first = batcher.submit_shared(Arc::clone(&job));
    let second = batcher.submit_shared(job);
    assert_ne!(first.id(), second.id());

    assert_eq!(first.await?.message, "42");
    assert_eq!(second.await?.message, "42");

    batcher.shutdown().await;
    Ok(())
}

struct Exploding;

#[async_trait]
impl Job for Exploding {
    async fn execute(&self) -> Result<JobResult, BatchError> {
        panic!("job exploded");
    }
}

#[tokio::test]
async fn panicking_job_does_not_affect_siblings() -> Result<()> {
    init_logger();
    let batcher = MicroBatcherBuilder::new()
        .executor(SequentialExecutor::new())
        .batch_size(5)
        .batch_interval_millis(20)
        .build()?;

    let first = batcher.submit(AddJob::new(1, 1));
    let exploding = batcher.submit(Exploding);
    let last = batcher.submit(AddJob::new(2, 2));

    assert_eq!(first.await?, JobResult::success("2"));
    let exploding = exploding.await?;
    assert!(!exploding.success);
    assert!(exploding.message.starts_with("job task failed"));
    assert_eq!(last.await?, JobResult::success("4"));

    let stats = batcher.shutdown().await.stats;
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_keep_their_own_order() -> Result<()> {
    let executor = RecordingExecutor::default();
    let batcher = Arc::new(
        MicroBatcherBuilder::new()
            .executor(executor.clone())
            .batch_size(7)
            .batch_interval_millis(15)
            .build()?,
    );

    let producers: Vec<_> = (0..4i64)
        .map(|producer| {
            let batcher = Arc::clone(&batcher);
            tokio::spawn(async move {
                let pending: Vec<_> = (0..25)
                    .map(|i| batcher.submit(AddJob::new(producer * 100 + i, 0)))
                    .collect();
                let mut messages = Vec::new();
                for pending in pending {
                    messages.push(pending.await?.message);
                }
                Ok::<_, BatchError>(messages)
            })
        })
        .collect();

    for (producer, handle) in producers.into_iter().enumerate() {
        let messages = handle.await??;
        let expected: Vec<String> = (0..25).map(|i| (producer * 100 + i).to_string()).collect();
        assert_eq!(messages, expected);
    }

    let stats = batcher.shutdown().await.stats;
    assert_eq!(stats.submitted, 100);
    assert_eq!(stats.succeeded, 100);

    let executed: Vec<i64> = executor
        .batches()
        .into_iter()
        .flatten()
        .map(|message| message.parse().unwrap())
        .collect();
    assert_eq!(executed.len(), 100);
    assert!(executor.batches().iter().all(|batch| batch.len() <= 7));
    for producer in 0..4 {
        let own: Vec<_> = executed.iter().filter(|v| **v / 100 == producer).collect();
        assert!(own.windows(2).all(|w| w[0] < w[1]));
    }
    Ok(())
}
