// src/exec/task.rs

//! Task bodies accepted by the executor.
//!
//! A task is a zero-argument closure producing a future. The closure is only
//! called once the executor admits the task, so no work happens at
//! submission time.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::task::JoinError;

/// The future a task body resolves to.
pub type TaskFuture<V> = Pin<Box<dyn Future<Output = anyhow::Result<V>> + Send + 'static>>;

/// A boxed, not-yet-started unit of work.
pub type TaskFn<V> = Box<dyn FnOnce() -> TaskFuture<V> + Send + 'static>;

/// Wrap an async closure as a task.
///
/// On timeout or cancellation the body is interrupted at its next `.await`
/// and dropped, so anything it owns is released.
pub fn task<F, Fut, V>(f: F) -> TaskFn<V>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    V: Send + 'static,
{
    Box::new(move || Box::pin(f()) as TaskFuture<V>)
}

/// Wrap a synchronous closure as a task running on Tokio's blocking pool.
///
/// Blocking code cannot be interrupted. On timeout or cancellation the
/// closure is abandoned: it keeps its thread until it returns on its own and
/// its result is discarded. Avoid this for work holding external resources
/// that must be released promptly.
pub fn blocking_task<F, V>(f: F) -> TaskFn<V>
where
    F: FnOnce() -> anyhow::Result<V> + Send + 'static,
    V: Send + 'static,
{
    task(move || async move {
        match tokio::task::spawn_blocking(f).await {
            Ok(result) => result,
            Err(err) => Err(anyhow!(join_error_message(err))),
        }
    })
}

/// Describe a failed Tokio join, extracting the panic payload if any.
pub(crate) fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        format!("task panicked: {}", panic_message(err.into_panic()))
    } else {
        "task was aborted".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
