// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod types;

use std::collections::{BTreeMap, HashMap};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, parse_duration, BatchFile, ExecutorConfig, TaskConfig};
use crate::errors::{BoundrunError, Result};
use crate::exec::{cancel_pair, command_task, CommandOutput, DeferQueue, Executor, TaskFn};

pub use crate::types::{ResultSet, RunSummary, TaskFailure, TaskOutcome};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - batch file loading and CLI overrides
/// - the executor, with Ctrl-C mapped to cancellation
/// - result rendering and the optional report file
///
/// Returns the process exit code: failure if any task did not succeed.
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let batch = load_and_validate(&args.config)?;
    let selected = select_tasks(&batch, &args.tasks)?;
    let exec_config = resolve_executor_config(&batch, &args)?;

    if args.dry_run {
        print_dry_run(&selected, &exec_config);
        return Ok(ExitCode::SUCCESS);
    }

    let (cancel, signal) = cancel_pair();

    // Ctrl-C → cancel the run; completed tasks keep their outcomes.
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("Ctrl-C received; cancelling run");
            cancel.cancel();
        })
    };

    let total = selected.len();
    let tasks: HashMap<String, TaskFn<CommandOutput>> = selected
        .iter()
        .map(|(name, task)| (name.clone(), command_task(name.as_str(), task.cmd.as_str())))
        .collect();

    let finished = Arc::new(AtomicUsize::new(0));
    let executor = Executor::new(exec_config)
        .with_cancellation(signal)
        .on_completion(move |name: &String, outcome: &TaskOutcome<CommandOutput>| {
            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            let status = match outcome.failure() {
                None => "ok".to_string(),
                Some(failure) => failure.to_string(),
            };
            eprintln!("[{done}/{total}] {name}: {status}");
        });

    let results = executor.run(tasks).await;
    ctrl_c.abort();
    let results = results?;

    for line in report::render_lines(&results) {
        println!("{line}");
    }

    let summary = results.summary();
    println!("{summary}");

    let deferred = DeferQueue::start();
    if let Some(path) = args.report.clone() {
        let report = report::render_report(&results);
        deferred.defer(move || {
            std::fs::write(&path, report)?;
            debug!(path = %path.display(), "report written");
            Ok(())
        });
    }
    deferred.defer(move || {
        info!(%summary, "batch finished");
        Ok(())
    });
    deferred.flush().await;

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Restrict the batch to the tasks named with `--task`, or keep all of them.
fn select_tasks<'a>(
    batch: &'a BatchFile,
    names: &[String],
) -> Result<BTreeMap<String, &'a TaskConfig>> {
    if names.is_empty() {
        return Ok(batch.task.iter().map(|(n, t)| (n.clone(), t)).collect());
    }

    let mut selected = BTreeMap::new();
    for name in names {
        let task = batch
            .task
            .get(name)
            .ok_or_else(|| BoundrunError::TaskNotFound(name.clone()))?;
        selected.insert(name.clone(), task);
    }
    Ok(selected)
}

/// Apply `--concurrency` / `--timeout` on top of the batch file's `[config]`.
pub fn resolve_executor_config(batch: &BatchFile, args: &CliArgs) -> Result<ExecutorConfig> {
    let mut config = batch.executor_config();

    if let Some(limit) = args.concurrency {
        config.concurrency_limit = limit;
    }

    if let Some(ref raw) = args.timeout {
        let timeout = parse_duration(raw)
            .map_err(|e| BoundrunError::ConfigError(format!("--timeout: {e}")))?;
        config = config.with_timeout(timeout);
    }

    config.validate()?;
    Ok(config)
}

/// Simple dry-run output: print resolved settings and the commands.
fn print_dry_run(tasks: &BTreeMap<String, &TaskConfig>, config: &ExecutorConfig) {
    println!("boundrun dry-run");
    println!("  concurrency_limit = {}", config.concurrency_limit);
    match config.per_task_timeout {
        Some(t) => println!("  per_task_timeout = {t:?}"),
        None => println!("  per_task_timeout = none"),
    }
    println!();

    println!("tasks ({}):", tasks.len());
    for (name, task) in tasks {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
    }

    debug!("dry-run complete (no execution)");
}
