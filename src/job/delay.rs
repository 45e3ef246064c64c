use std::time::Duration;

use async_trait::async_trait;

use crate::{
    BatchError,
    core::job::{Job, JobResult},
};

/// Waits for `delay` without blocking the runtime, then succeeds with `message`.
#[derive(Debug, Clone)]
pub struct DelayJob {
    delay: Duration,
    message: String,
}

impl DelayJob {
    pub fn new(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            delay,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Job for DelayJob {
    async fn execute(&self) -> Result<JobResult, BatchError> {
        tokio::time::sleep(self.delay).await;
        Ok(JobResult::success(self.message.clone()))
    }
}
