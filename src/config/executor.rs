// src/config/executor.rs

use std::num::NonZero;
use std::time::Duration;

use crate::errors::{BoundrunError, Result};

/// Per-invocation executor settings.
///
/// Passed explicitly to every `run` call; there is no process-wide default
/// executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Maximum number of tasks executing at the same time. Must be >= 1.
    pub concurrency_limit: usize,

    /// If set, a task still running after this long is recorded as
    /// `Failure(Timeout)`.
    pub per_task_timeout: Option<Duration>,
}

impl ExecutorConfig {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit,
            per_task_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_task_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            return Err(BoundrunError::ConfigError(
                "concurrency_limit must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExecutorConfig {
    /// One slot per available CPU, no timeout.
    fn default() -> Self {
        Self::new(default_concurrency_limit())
    }
}

pub(crate) fn default_concurrency_limit() -> usize {
    std::thread::available_parallelism()
        .map(NonZero::get)
        .unwrap_or(1)
}
