// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::executor::{default_concurrency_limit, ExecutorConfig};
use crate::config::model::{BatchFile, RawBatchFile};
use crate::errors::{BoundrunError, Result};

impl TryFrom<RawBatchFile> for BatchFile {
    type Error = BoundrunError;

    fn try_from(raw: RawBatchFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_task_commands(&raw)?;
        let executor = resolve_executor_config(&raw)?;
        Ok(BatchFile::new_unchecked(raw.config, raw.task, executor))
    }
}

fn ensure_has_tasks(cfg: &RawBatchFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BoundrunError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_commands(cfg: &RawBatchFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(BoundrunError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

fn resolve_executor_config(cfg: &RawBatchFile) -> Result<ExecutorConfig> {
    let limit = cfg
        .config
        .concurrency_limit
        .unwrap_or_else(default_concurrency_limit);

    if limit == 0 {
        return Err(BoundrunError::ConfigError(
            "[config].concurrency_limit must be >= 1 (got 0)".to_string(),
        ));
    }

    let mut executor = ExecutorConfig::new(limit);
    if let Some(ref raw) = cfg.config.per_task_timeout {
        let timeout = parse_duration(raw).map_err(|e| {
            BoundrunError::ConfigError(format!("[config].per_task_timeout: {e}"))
        })?;
        executor = executor.with_timeout(timeout);
    }

    Ok(executor)
}
