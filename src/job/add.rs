use async_trait::async_trait;

use crate::{
    BatchError,
    core::job::{Job, JobResult},
};

/// Computes `left + right`; the result message is the decimal sum.
///
/// An overflowing sum is reported as a job error.
#[derive(Debug, Clone, Copy)]
pub struct AddJob {
    left: i64,
    right: i64,
}

impl AddJob {
    pub fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }
}

#[async_trait]
impl Job for AddJob {
    async fn execute(&self) -> Result<JobResult, BatchError> {
        self.left
            .checked_add(self.right)
            .map(|sum| JobResult::success(sum.to_string()))
            .ok_or_else(|| {
                BatchError::Job(format!("{} + {} overflows", self.left, self.right))
            })
    }
}
