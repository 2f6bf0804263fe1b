// src/report.rs

//! Plain-text rendering of a finished batch.

use std::collections::BTreeMap;

use crate::exec::CommandOutput;
use crate::types::{ResultSet, TaskFailure, TaskOutcome};

/// One line per task, sorted by task name.
///
/// ```text
/// ok        build (exit 0)
/// failed    test: command exited with status 1
/// timeout   lint
/// cancelled docs
/// ```
pub fn render_lines(results: &ResultSet<String, CommandOutput>) -> Vec<String> {
    let sorted: BTreeMap<&String, &TaskOutcome<CommandOutput>> = results.iter().collect();

    sorted
        .into_iter()
        .map(|(name, outcome)| match outcome {
            TaskOutcome::Success(out) => format!("ok        {name} (exit {})", out.exit_code),
            TaskOutcome::Failure(TaskFailure::Task(msg)) => format!("failed    {name}: {msg}"),
            TaskOutcome::Failure(TaskFailure::Timeout) => format!("timeout   {name}"),
            TaskOutcome::Failure(TaskFailure::Cancelled) => format!("cancelled {name}"),
        })
        .collect()
}

/// Full report: the per-task lines followed by the summary line.
pub fn render_report(results: &ResultSet<String, CommandOutput>) -> String {
    let mut out = render_lines(results).join("\n");
    out.push('\n');
    out.push_str(&results.summary().to_string());
    out.push('\n');
    out
}
