use std::sync::Arc;

use async_trait::async_trait;
use log::{error, warn};

use crate::core::{
    executor::BatchExecutor,
    job::{Job, JobResult},
};

/// Executes all jobs of a batch concurrently, each as its own tokio task.
///
/// Results are collected in submission order whatever the completion order. A
/// job returning an error, or whose task panics, yields a failed [`JobResult`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelExecutor {}

impl ParallelExecutor {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl BatchExecutor for ParallelExecutor {
    async fn process_batch(&self, jobs: &[Arc<dyn Job>]) -> Vec<JobResult> {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| {
                let job = Arc::clone(job);
                tokio::spawn(async move { job.execute().await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = match handle.await {
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
