#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 <div align="center">
   <h1>Micro-Batch for Rust</h1>
   <h3>Group individually submitted jobs into size- and time-bounded batches</h3>

   ![license](https://shields.io/badge/license-MIT%2FApache--2.0-blue)

  </div>

 # Micro-Batch for Rust

 Many backends are far cheaper to call once with fifty items than fifty times with one.
 **Micro-Batch for Rust** sits between callers that produce work one item at a time and a
 batch executor that prefers to receive it in groups. Callers submit jobs and immediately get
 a handle they can await; the batcher groups queued jobs and hands them to the executor on a
 fixed schedule.

 ## Core Concepts

- **Job:** A unit of work exposing a single asynchronous `execute` operation returning a `JobResult`.
- **JobResult:** `{ success, message }`, produced exactly once per job.
- **BatchExecutor:** Runs a batch of jobs and returns one result per job, in the same order.
- **MicroBatcher:** Owns the queue and the drain loop. Every `batch_interval_millis` it takes up
  to `batch_size` jobs, in submission order, and runs them through the executor.
- **PendingResult:** The handle returned by `submit`, resolved when the job's batch has run.

 A batch is never triggered early: when a tick fires, it takes at most `batch_size` jobs, and
 the rest wait for the next tick. Latency and throughput are tuned with those two values only.

 `shutdown` stops the schedule, waits for the batch in flight, then runs everything still
 queued in one final batch, so no job submitted before the shutdown is lost.

 ## Features

| **Feature**   | **Description**                                                       |
|---------------|-----------------------------------------------------------------------|
| jobs          | Enables demo jobs (`AddJob`, `DelayJob`, `FailingJob`)                |
| logger        | Enables a `LoggingExecutor` decorator, useful for debugging purposes  |
| full          | Enables all available features                                        |

 ## Getting Started

```rust
use micro_batch_rs::{
    core::{
        batcher::MicroBatcherBuilder,
        job::{FnJob, JobResult},
    },
    executor::parallel::ParallelExecutor,
    BatchError,
};

#[tokio::main]
async fn main() -> Result<(), BatchError> {
    let batcher = MicroBatcherBuilder::new()
        .name("squares".to_string())
        .executor(ParallelExecutor::new())
        .batch_size(10) // at most 10 jobs per batch
        .batch_interval_millis(50) // one batch every 50ms
        .build()?;

    let pending: Vec<_> = (0..25)
        .map(|i: u64| {
            batcher.submit(FnJob::new(move || async move {
                Ok::<_, BatchError>(JobResult::success((i * i).to_string()))
            }))
        })
        .collect();

    for (i, result) in pending.into_iter().enumerate() {
        let result = result.await?;
        assert_eq!(result.message, (i * i).to_string());
    }

    let execution = batcher.shutdown().await;
    assert_eq!(execution.stats.succeeded, 25);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 ## Contribution
 Unless you explicitly state otherwise, any contribution intentionally submitted
 for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
 dual licensed as above, without any additional terms or conditions

 */

/// Core module for batching: jobs, queue, configuration and the batcher itself
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of batch executors (sequential, parallel, logging)
pub mod executor;

#[cfg(feature = "jobs")]
/// Set of demo jobs, useful for examples and tests
pub mod job;

#[doc(inline)]
pub use crate::core::{
    batcher::{BatcherState, BatcherStats, MicroBatcher, MicroBatcherBuilder},
    config::{BatchBounds, BatchConfig},
    executor::BatchExecutor,
    job::{FnJob, Job, JobResult},
    pending::PendingResult,
};
