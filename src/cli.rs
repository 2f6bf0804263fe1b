// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `boundrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "boundrun",
    version,
    about = "Run a batch of shell commands with bounded concurrency.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the batch file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Maximum number of commands running at once.
    ///
    /// Overrides `[config].concurrency_limit`.
    #[arg(long, short = 'j', value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-command timeout, e.g. `500ms`, `30s`, `2m`.
    ///
    /// Overrides `[config].per_task_timeout`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Run only this task. May be repeated.
    #[arg(long = "task", value_name = "NAME")]
    pub tasks: Vec<String>,

    /// Write a plain-text report of the run to this file once it finishes.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BOUNDRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the tasks, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
