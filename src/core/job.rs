use std::{fmt, future::Future};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::BatchError;

/// Outcome of a single job execution.
///
/// A `JobResult` is produced exactly once per submitted job, either by the job
/// itself or synthesized by an executor or the batcher when execution fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Whether the job completed successfully
    pub success: bool,
    /// Job output on success, failure description otherwise
    pub message: String,
}

impl JobResult {
    /// Builds a successful result carrying `message`.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Builds a failed result carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "success" } else { "failure" };
        write!(f, "{}: {}", status, self.message)
    }
}

/// A unit of work submitted to the batcher.
///
/// Jobs are shared with the batch executor once they have been drained from the
/// queue, so implementations must be `Send + Sync`. A job may be pure or may
/// perform I/O; an `Err` returned from `execute` is turned into a failed
/// [`JobResult`] by the executor rather than aborting the batch.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use micro_batch_rs::{core::job::{Job, JobResult}, BatchError};
///
/// struct Greet(String);
///
/// #[async_trait]
/// impl Job for Greet {
///     async fn execute(&self) -> Result<JobResult, BatchError> {
///         Ok(JobResult::success(format!("hello {}", self.0)))
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync {
    /// Runs the job and returns its result.
    async fn execute(&self) -> Result<JobResult, BatchError>;
}

/// Adapts a closure returning a future into a [`Job`].
pub struct FnJob<F> {
    func: F,
}

impl<F> FnJob<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Job for FnJob<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<JobResult, BatchError>> + Send,
{
    async fn execute(&self) -> Result<JobResult, BatchError> {
        (self.func)().await
    }
}
