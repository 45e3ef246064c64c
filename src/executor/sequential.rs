use std::sync::Arc;

use async_trait::async_trait;
use log::{error, warn};

use crate::core::{
    executor::BatchExecutor,
    job::{Job, JobResult},
};

/// Executes the jobs of a batch in order, one at a time.
///
/// A job returning an error does not stop the batch: the error is turned into a
/// failed [`JobResult`] whose message is the error description, and the next
/// job runs. Each job runs in its own task, so a panicking job only fails
/// itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor {}

impl SequentialExecutor {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl BatchExecutor for SequentialExecutor {
    async fn process_batch(&self, jobs: &[Arc<dyn Job>]) -> Vec<JobResult> {
        let mut results = Vec::with_capacity(jobs.len());

        for job in jobs {
            let job = Arc::clone(job);
            let result = match tokio::spawn(async move { job.execute().await }).await {
                Ok(Ok(result)) => result,
                Ok(Err(error)) => {
                    warn!("Error executing job: {}", error);
                    JobResult::failure(error.to_string())
                }
                Err(join_error) => {
                    error!("Job task failed: {}", join_error);
                    JobResult::failure(format!("job task failed: {}", join_error))
                }
            };
            results.push(result);
        }

        results
    }
}
