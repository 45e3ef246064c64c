use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::BatchError;

/// Open-interval limits a [`BatchConfig`] is validated against.
///
/// Both ranges are exclusive on each side: with the defaults, a batch size must
/// satisfy `2 < batch_size < 1000` and an interval `10 < millis < 600000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchBounds {
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub min_interval_millis: u64,
    pub max_interval_millis: u64,
}

impl BatchBounds {
    pub const DEFAULT: BatchBounds = BatchBounds {
        min_batch_size: 2,
        max_batch_size: 1000,
        min_interval_millis: 10,
        max_interval_millis: 600_000,
    };

    /// Checks that each open interval contains at least one value.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.min_batch_size.saturating_add(1) >= self.max_batch_size {
            return Err(BatchError::InvalidBounds(format!(
                "no batch size fits in ({}, {})",
                self.min_batch_size, self.max_batch_size
            )));
        }
        if self.min_interval_millis.saturating_add(1) >= self.max_interval_millis {
            return Err(BatchError::InvalidBounds(format!(
                "no interval fits in ({}ms, {}ms)",
                self.min_interval_millis, self.max_interval_millis
            )));
        }
        Ok(())
    }
}

impl Default for BatchBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Batching parameters: how many jobs a tick may take and how long a tick waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of jobs handed to the executor per tick
    pub batch_size: usize,
    /// Time between two drain ticks, in milliseconds
    pub batch_interval_millis: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_interval_millis: 100,
        }
    }
}

impl BatchConfig {
    pub fn new(batch_size: usize, batch_interval_millis: u64) -> Self {
        Self {
            batch_size,
            batch_interval_millis,
        }
    }

    /// Parses a configuration from a JSON document. Missing fields take their
    /// default value. The result is not validated.
    ///
    /// ```
    /// use micro_batch_rs::core::config::BatchConfig;
    ///
    /// let config = BatchConfig::from_json(r#"{"batch_size": 10}"#).unwrap();
    /// assert_eq!(config.batch_size, 10);
    /// assert_eq!(config.batch_interval_millis, 100);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        serde_json::from_str(json).map_err(|error| BatchError::Config(error.to_string()))
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_millis)
    }

    /// Checks both parameters against the open intervals of `bounds`.
    pub fn validate(&self, bounds: &BatchBounds) -> Result<(), BatchError> {
        bounds.validate()?;

        if self.batch_size <= bounds.min_batch_size || self.batch_size >= bounds.max_batch_size {
            return Err(BatchError::InvalidBatchSize {
                value: self.batch_size,
                min: bounds.min_batch_size,
                max: bounds.max_batch_size,
            });
        }

        if self.batch_interval_millis <= bounds.min_interval_millis
            || self.batch_interval_millis >= bounds.max_interval_millis
        {
            return Err(BatchError::InvalidBatchInterval {
                value: self.batch_interval_millis,
                min: bounds.min_interval_millis,
                max: bounds.max_interval_millis,
            });
        }

        Ok(())
    }
}
