//! Mock version of a batch executor
use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;

use micro_batch_rs::{BatchExecutor, Job, JobResult};

mock! {
    pub Executor {}
    #[async_trait]
    impl BatchExecutor for Executor {
        async fn process_batch(&self, jobs: &[Arc<dyn Job>]) -> Vec<JobResult>;
    }
}
