/// Runs the jobs of a batch one after the other.
pub mod sequential;

/// Runs every job of a batch as its own task.
pub mod parallel;

#[cfg(feature = "logger")]
/// This module provides an executor decorator logging every job result.
pub mod logger;
