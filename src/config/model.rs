// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::executor::ExecutorConfig;

/// Batch file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// concurrency_limit = 4
/// per_task_timeout = "30s"
///
/// [task.build]
/// cmd = "cargo build"
/// ```
///
/// All sections are optional at this stage; [`BatchFile`] enforces the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBatchFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of commands running at once.
    ///
    /// Defaults to the number of available CPUs.
    #[serde(default)]
    pub concurrency_limit: Option<usize>,

    /// Duration string (e.g. `"30s"`) after which a running command is
    /// killed and recorded as timed out.
    #[serde(default)]
    pub per_task_timeout: Option<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The shell command to execute.
    pub cmd: String,
}

/// A validated batch file.
///
/// Only constructible through `TryFrom<RawBatchFile>` (see `validate.rs`), so
/// holding one means the task table is non-empty and `[config]` resolved to a
/// valid [`ExecutorConfig`].
#[derive(Debug, Clone)]
pub struct BatchFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
    executor: ExecutorConfig,
}

impl BatchFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<String, TaskConfig>,
        executor: ExecutorConfig,
    ) -> Self {
        Self {
            config,
            task,
            executor,
        }
    }

    /// Executor settings resolved from `[config]`.
    pub fn executor_config(&self) -> ExecutorConfig {
        self.executor
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.task.keys().map(String::as_str)
    }
}
