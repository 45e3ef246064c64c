use std::sync::Arc;

use async_trait::async_trait;

use super::job::{Job, JobResult};

/// Runs a batch of jobs and reports one result per job.
///
/// The returned vector must have the same length as `jobs`, and result `i` must
/// belong to job `i`: the batcher matches results to callers purely by
/// position. Implementations decide whether jobs run one after the other or
/// concurrently, and should turn a failing job into a failed [`JobResult`]
/// instead of abandoning the rest of the batch.
///
/// The batcher does not trust this contract blindly: missing results are
/// replaced by failed results and surplus results are discarded.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn process_batch(&self, jobs: &[Arc<dyn Job>]) -> Vec<JobResult>;
}

