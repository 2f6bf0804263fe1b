// src/exec/executor.rs

//! Bounded concurrent task executor.
//!
//! One call to [`Executor::run`] owns everything it needs for that call:
//!
//! - a shared queue of pending `(key, task)` pairs,
//! - `min(concurrency_limit, tasks)` worker Tokio tasks pulling from it,
//! - an mpsc channel on which workers report `(key, outcome)`,
//! - the [`ResultSet`], written only by the coordinating `run` future.
//!
//! Each worker runs one task at a time, which is what bounds concurrency.
//! Task bodies run in their own Tokio task so that panics are caught at the
//! task boundary and a timed-out or cancelled body can be aborted.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::errors::Result;
use crate::exec::cancel::CancelSignal;
use crate::exec::task::{join_error_message, TaskFn};
use crate::types::{ResultSet, TaskFailure, TaskOutcome};

type PendingQueue<K, V> = Arc<Mutex<VecDeque<(K, TaskFn<V>)>>>;
type Observer<K, V> = Box<dyn Fn(&K, &TaskOutcome<V>) + Send + Sync>;

/// Run `tasks` under `config` with no cancellation and no observer.
///
/// Fails only with `ConfigError`, before any task starts.
pub async fn run<K, V>(
    tasks: HashMap<K, TaskFn<V>>,
    config: ExecutorConfig,
) -> Result<ResultSet<K, V>>
where
    K: Eq + Hash + fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    Executor::new(config).run(tasks).await
}

/// Executor for one or more independent `run` calls.
///
/// Holds only settings; no state carries over between runs.
pub struct Executor<K, V> {
    config: ExecutorConfig,
    cancel: Option<CancelSignal>,
    observer: Option<Observer<K, V>>,
}

impl<K, V> fmt::Debug for Executor<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl<K, V> Executor<K, V>
where
    K: Eq + Hash + fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            cancel: None,
            observer: None,
        }
    }

    /// Stop the run when `signal` fires.
    ///
    /// Tasks not yet started are never started. Active tasks are aborted at
    /// their next `.await` (blocking bodies are abandoned). Both are recorded
    /// as `Failure(Cancelled)`.
    pub fn with_cancellation(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Call `observer` once per task, as soon as its outcome is known.
    ///
    /// Runs on the coordinating future; keep it cheap.
    pub fn on_completion<F>(mut self, observer: F) -> Self
    where
        F: Fn(&K, &TaskOutcome<V>) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute every task and return one outcome per key.
    ///
    /// Task errors, panics, timeouts and cancellation are all recorded in the
    /// result set; the only error returned from here is `ConfigError`.
    pub async fn run(&self, tasks: HashMap<K, TaskFn<V>>) -> Result<ResultSet<K, V>> {
        self.config.validate()?;

        let total = tasks.len();
        let mut results = ResultSet::with_capacity(total);
        if total == 0 {
            debug!("no tasks submitted; returning empty result set");
            return Ok(results);
        }

        let worker_count = self.config.concurrency_limit.min(total);
        info!(
            tasks = total,
            workers = worker_count,
            timeout = ?self.config.per_task_timeout,
            "executor run started"
        );

        let queue: PendingQueue<K, V> = Arc::new(Mutex::new(tasks.into_iter().collect()));
        let cancel = self.cancel.clone().unwrap_or_else(CancelSignal::never);
        let (done_tx, mut done_rx) = mpsc::channel::<(K, TaskOutcome<V>)>(total);

        // Dropping the JoinSet aborts the workers, so abandoning this future
        // also stops the run.
        let mut workers = JoinSet::new();
        for worker in 0..worker_count {
            workers.spawn(worker_loop(
                worker,
                Arc::clone(&queue),
                done_tx.clone(),
                cancel.clone(),
                self.config.per_task_timeout,
            ));
        }
        drop(done_tx);

        // Closes once every worker has exited.
        while let Some((key, outcome)) = done_rx.recv().await {
            self.record(&mut results, key, outcome);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "executor worker exited abnormally");
            }
        }

        // Anything still queued was never started.
        let leftover: Vec<_> = lock_queue(&queue).drain(..).collect();
        if !leftover.is_empty() {
            info!(
                count = leftover.len(),
                "run cancelled; recording unstarted tasks as cancelled"
            );
        }
        for (key, _task) in leftover {
            self.record(&mut results, key, TaskOutcome::Failure(TaskFailure::Cancelled));
        }

        info!(summary = %results.summary(), "executor run finished");
        Ok(results)
    }

    fn record(&self, results: &mut ResultSet<K, V>, key: K, outcome: TaskOutcome<V>) {
        match &outcome {
            TaskOutcome::Success(_) => debug!(task = ?key, "task succeeded"),
            TaskOutcome::Failure(TaskFailure::Task(msg)) => {
                warn!(task = ?key, error = %msg, "task failed")
            }
            TaskOutcome::Failure(TaskFailure::Timeout) => {
                warn!(task = ?key, "task timed out")
            }
            TaskOutcome::Failure(TaskFailure::Cancelled) => {
                debug!(task = ?key, "task cancelled")
            }
        }

        if let Some(observer) = &self.observer {
            observer(&key, &outcome);
        }

        if !results.record(key, outcome) {
            warn!("duplicate outcome for task key; keeping the first one");
        }
    }
}

/// Pull tasks until the queue is empty, the run is cancelled, or the
/// coordinator goes away.
async fn worker_loop<K, V>(
    worker: usize,
    queue: PendingQueue<K, V>,
    done_tx: mpsc::Sender<(K, TaskOutcome<V>)>,
    mut cancel: CancelSignal,
    timeout: Option<Duration>,
) where
    K: fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    loop {
        if cancel.is_cancelled() {
            debug!(worker, "cancellation observed at task boundary; worker stopping");
            break;
        }

        // Bind first so the lock is released before awaiting.
        let next = lock_queue(&queue).pop_front();
        let Some((key, body)) = next else {
            break;
        };

        debug!(worker, task = ?key, "task admitted");
        let outcome = run_one(body, timeout, &mut cancel).await;

        if done_tx.send((key, outcome)).await.is_err() {
            debug!(worker, "result channel closed; worker stopping");
            break;
        }
    }
}

/// Execute a single task body, applying the timeout and watching for
/// cancellation.
async fn run_one<V>(
    body: TaskFn<V>,
    timeout: Option<Duration>,
    cancel: &mut CancelSignal,
) -> TaskOutcome<V>
where
    V: Send + 'static,
{
    // Calling `body` inside the spawned task keeps a panicking closure
    // contained as well as a panicking future.
    let mut handle = tokio::spawn(async move { body().await });
    let _abort = AbortOnDrop(handle.abort_handle());

    let finished = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, &mut handle).await.ok(),
            None => Some((&mut handle).await),
        }
    };

    tokio::select! {
        joined = finished => match joined {
            Some(Ok(Ok(value))) => TaskOutcome::Success(value),
            Some(Ok(Err(err))) => TaskOutcome::Failure(TaskFailure::Task(format!("{err:#}"))),
            Some(Err(err)) if err.is_cancelled() => TaskOutcome::Failure(TaskFailure::Cancelled),
            Some(Err(err)) => TaskOutcome::Failure(TaskFailure::Task(join_error_message(err))),
            None => TaskOutcome::Failure(TaskFailure::Timeout),
        },
        _ = cancel.cancelled() => TaskOutcome::Failure(TaskFailure::Cancelled),
    }
}

/// Aborts the body's Tokio task when the worker is done with it, whether it
/// finished, timed out, was cancelled, or the worker itself was aborted.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn lock_queue<K, V>(
    queue: &PendingQueue<K, V>,
) -> std::sync::MutexGuard<'_, VecDeque<(K, TaskFn<V>)>> {
    // Queue operations never panic while holding the lock; recover anyway.
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}
