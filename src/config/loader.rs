// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{BatchFile, RawBatchFile};
use crate::errors::Result;

/// Load a batch file from a given path and return the raw `RawBatchFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawBatchFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawBatchFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a batch file from path and validate it.
///
/// - Reads TOML.
/// - Checks that at least one task exists and no `cmd` is empty.
/// - Resolves `[config]` into an `ExecutorConfig` (default concurrency,
///   timeout parsing, `concurrency_limit >= 1`).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BatchFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let batch = BatchFile::try_from(raw)?;
    debug!(
        path = %path.display(),
        tasks = batch.task.len(),
        "loaded batch file"
    );
    Ok(batch)
}

/// Default batch file location: `Boundrun.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Boundrun.toml")
}
