// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`task`] defines task bodies (`TaskFn`) and their constructors.
//! - [`executor`] runs a keyed set of tasks under a concurrency cap, with
//!   optional per-task timeout, and collects a [`ResultSet`].
//! - [`cancel`] provides the handle/signal pair used to cancel a run.
//! - [`defer`] is the background FIFO queue for deferred callbacks.
//! - [`command`] turns shell commands into tasks via `tokio::process`.
//!
//! [`ResultSet`]: crate::types::ResultSet

pub mod cancel;
pub mod command;
pub mod defer;
pub mod executor;
pub mod task;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use command::{command_task, run_command, CommandOutput};
pub use defer::{error_sink, set_error_sink, DeferQueue, DeferredFn, ErrorSink, TracingErrorSink};
pub use executor::{run, Executor};
pub use task::{blocking_task, task, TaskFn, TaskFuture};
