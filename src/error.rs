use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Batch error
pub enum BatchError {
    #[error("batch size {value} is outside the open interval ({min}, {max})")]
    InvalidBatchSize { value: usize, min: usize, max: usize },

    #[error("batch interval {value}ms is outside the open interval ({min}ms, {max}ms)")]
    InvalidBatchInterval { value: u64, min: u64, max: u64 },

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Config from: {0}")]
    Config(String),

    #[error("Runtime from: {0}")]
    Runtime(String),

    #[error("Job from: {0}")]
    Job(String),

    #[error("Result of job {0} was dropped before being resolved")]
    ResultDropped(Uuid),
}
