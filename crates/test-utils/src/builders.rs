#![allow(dead_code)]

use std::collections::BTreeMap;
use boundrun::config::{BatchFile, ConfigSection, RawBatchFile, TaskConfig};

/// Builder for `BatchFile` to simplify test setup.
pub struct BatchFileBuilder {
    config: RawBatchFile,
}

impl BatchFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawBatchFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, cmd: &str) -> Self {
        self.config.task.insert(
            name.to_string(),
            TaskConfig {
                cmd: cmd.to_string(),
            },
        );
        self
    }

    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.config.config.concurrency_limit = Some(limit);
        self
    }

    pub fn per_task_timeout(mut self, duration: &str) -> Self {
        self.config.config.per_task_timeout = Some(duration.to_string());
        self
    }

    pub fn build_raw(self) -> RawBatchFile {
        self.config
    }

    pub fn build(self) -> BatchFile {
        BatchFile::try_from(self.config).expect("Failed to build valid batch file from builder")
    }
}

impl Default for BatchFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
