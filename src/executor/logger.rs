use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::core::{
    executor::BatchExecutor,
    job::{Job, JobResult},
};

/// Wraps another executor and logs every result it produces as JSON.
pub struct LoggingExecutor<E> {
    inner: E,
}

impl<E: BatchExecutor> LoggingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: BatchExecutor> BatchExecutor for LoggingExecutor<E> {
    async fn process_batch(&self, jobs: &[Arc<dyn Job>]) -> Vec<JobResult> {
        let results = self.inner.process_batch(jobs).await;
        results.iter().for_each(|result| match serde_json::to_string(result) {
            Ok(json) => info!("Record:{}", json),
            Err(_) => info!("Record:{:?}", result),
        });
        results
    }
}
