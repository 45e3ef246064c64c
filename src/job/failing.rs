use async_trait::async_trait;

use crate::{
    BatchError,
    core::job::{Job, JobResult},
};

/// A job whose execution always returns `BatchError::Job(reason)`.
#[derive(Debug, Clone)]
pub struct FailingJob {
    reason: String,
}

impl FailingJob {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Job for FailingJob {
    async fn execute(&self) -> Result<JobResult, BatchError> {
        Err(BatchError::Job(self.reason.clone()))
    }
}
