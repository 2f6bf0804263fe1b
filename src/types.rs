// src/types.rs

//! Outcome types shared by the executor and its callers.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// Why a task did not produce a value.
///
/// The `Display` output is the error description recorded for the task:
/// the body's own message, `"timeout"` or `"cancelled"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// The task body returned an error or panicked.
    #[error("{0}")]
    Task(String),

    /// The task did not finish within `per_task_timeout`.
    #[error("timeout")]
    Timeout,

    /// The run was cancelled before this task could finish.
    #[error("cancelled")]
    Cancelled,
}

/// Outcome of a single task. Exactly one is produced per submitted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<V> {
    Success(V),
    Failure(TaskFailure),
}

impl<V> TaskOutcome<V> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            TaskOutcome::Success(v) => Some(v),
            TaskOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskOutcome::Success(_) => None,
            TaskOutcome::Failure(f) => Some(f),
        }
    }

    /// The recorded error description, if this outcome is a failure.
    pub fn failure_description(&self) -> Option<String> {
        self.failure().map(|f| f.to_string())
    }
}

/// Per-kind counts over a [`ResultSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.timed_out + self.cancelled
    }

    pub fn has_failures(&self) -> bool {
        self.succeeded != self.total()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks: {} succeeded, {} failed, {} timed out, {} cancelled",
            self.total(),
            self.succeeded,
            self.failed,
            self.timed_out,
            self.cancelled
        )
    }
}

/// Mapping from task key to outcome, returned by a completed executor run.
///
/// Iteration order is unspecified.
#[derive(Debug, Clone)]
pub struct ResultSet<K, V> {
    outcomes: HashMap<K, TaskOutcome<V>>,
}

impl<K: Eq + Hash, V> ResultSet<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: HashMap::with_capacity(capacity),
        }
    }

    /// Record an outcome. Returns `false` if the key already had one, in
    /// which case the first outcome is kept.
    pub(crate) fn record(&mut self, key: K, outcome: TaskOutcome<V>) -> bool {
        match self.outcomes.entry(key) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(outcome);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&TaskOutcome<V>> {
        self.outcomes.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.outcomes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.outcomes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &TaskOutcome<V>)> {
        self.outcomes.iter()
    }

    /// Keys and values of successful tasks.
    pub fn successes(&self) -> impl Iterator<Item = (&K, &V)> {
        self.outcomes
            .iter()
            .filter_map(|(k, o)| o.value().map(|v| (k, v)))
    }

    /// Keys and failure reasons of unsuccessful tasks.
    pub fn failures(&self) -> impl Iterator<Item = (&K, &TaskFailure)> {
        self.outcomes
            .iter()
            .filter_map(|(k, o)| o.failure().map(|f| (k, f)))
    }

    pub fn is_all_success(&self) -> bool {
        self.outcomes.values().all(TaskOutcome::is_success)
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for outcome in self.outcomes.values() {
            match outcome {
                TaskOutcome::Success(_) => summary.succeeded += 1,
                TaskOutcome::Failure(TaskFailure::Task(_)) => summary.failed += 1,
                TaskOutcome::Failure(TaskFailure::Timeout) => summary.timed_out += 1,
                TaskOutcome::Failure(TaskFailure::Cancelled) => summary.cancelled += 1,
            }
        }
        summary
    }

    pub fn into_inner(self) -> HashMap<K, TaskOutcome<V>> {
        self.outcomes
    }
}

impl<K, V> IntoIterator for ResultSet<K, V> {
    type Item = (K, TaskOutcome<V>);
    type IntoIter = hash_map::IntoIter<K, TaskOutcome<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}
