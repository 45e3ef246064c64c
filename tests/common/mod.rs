#![allow(dead_code)]

mod mocks;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use micro_batch_rs::{BatchExecutor, Job, JobResult, executor::sequential::SequentialExecutor};

pub use mocks::MockExecutor;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sequential executor remembering the messages of every batch it ran.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingExecutor {
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchExecutor for RecordingExecutor {
    async fn process_batch(&self, jobs: &[Arc<dyn Job>]) -> Vec<JobResult> {
        let results = SequentialExecutor::new().process_batch(jobs).await;
        self.batches
            .lock()
            .unwrap()
            .push(results.iter().map(|r| r.message.clone()).collect());
        results
    }
}
