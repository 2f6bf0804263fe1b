// src/config/mod.rs

//! Configuration for boundrun.
//!
//! Responsibilities:
//! - The per-invocation [`ExecutorConfig`] (`executor.rs`).
//! - The TOML-backed batch file model (`model.rs`).
//! - Loading a batch file from disk (`loader.rs`).
//! - Validating it and resolving executor settings (`validate.rs`).

pub mod duration;
pub mod executor;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use executor::ExecutorConfig;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{BatchFile, ConfigSection, RawBatchFile, TaskConfig};
