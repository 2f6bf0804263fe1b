// src/exec/defer.rs

//! Deferred callbacks.
//!
//! A [`DeferQueue`] runs zero-argument callbacks in the background, one at a
//! time, in the order they were deferred. `defer` never blocks the caller.
//! Callbacks run on Tokio's blocking pool, so they may do synchronous IO.
//!
//! A callback's error (or panic) is never returned to the code that deferred
//! it. It goes to an [`ErrorSink`]: by default the process-wide sink, which
//! logs through `tracing` unless something else was installed with
//! [`set_error_sink`].
//!
//! Exit-time flushing: call [`DeferQueue::flush`] before the process exits.
//! It waits until every callback deferred so far has run. A queue dropped
//! without flushing keeps draining only while the Tokio runtime is alive;
//! callbacks still pending at runtime shutdown are lost.

use std::sync::{Arc, OnceLock};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::errors::{BoundrunError, Result};
use crate::exec::task::join_error_message;

/// A deferred callback.
pub type DeferredFn = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Receives errors raised inside deferred callbacks.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &anyhow::Error);
}

/// Default sink: logs each error at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, error: &anyhow::Error) {
        error!(error = %format!("{error:#}"), "deferred callback failed");
    }
}

static ERROR_SINK: OnceLock<Arc<dyn ErrorSink>> = OnceLock::new();

/// Install the process-wide error sink.
///
/// Can be done once, before the first queue picks up the default.
pub fn set_error_sink(sink: Arc<dyn ErrorSink>) -> Result<()> {
    ERROR_SINK.set(sink).map_err(|_| {
        BoundrunError::ConfigError("process-wide error sink is already installed".to_string())
    })
}

/// The process-wide error sink, installing [`TracingErrorSink`] on first use.
pub fn error_sink() -> Arc<dyn ErrorSink> {
    Arc::clone(ERROR_SINK.get_or_init(|| Arc::new(TracingErrorSink)))
}

/// FIFO background queue of deferred callbacks.
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct DeferQueue {
    tx: mpsc::UnboundedSender<DeferredFn>,
    consumer: JoinHandle<()>,
}

impl DeferQueue {
    /// Start a queue reporting to the process-wide error sink.
    pub fn start() -> Self {
        Self::with_sink(error_sink())
    }

    /// Start a queue reporting to `sink`.
    pub fn with_sink(sink: Arc<dyn ErrorSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<DeferredFn>();
        let consumer = tokio::spawn(drain(rx, sink));
        Self { tx, consumer }
    }

    /// Schedule `callback` to run after everything deferred before it.
    pub fn defer<F>(&self, callback: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        if self.tx.send(Box::new(callback)).is_err() {
            warn!("defer queue consumer has stopped; dropping callback");
        }
    }

    /// Close the queue and wait for every pending callback to finish.
    pub async fn flush(self) {
        let DeferQueue { tx, consumer } = self;
        drop(tx);

        if let Err(err) = consumer.await {
            warn!(error = %err, "defer queue consumer exited abnormally");
        }
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<DeferredFn>, sink: Arc<dyn ErrorSink>) {
    let mut ran = 0usize;

    while let Some(callback) = rx.recv().await {
        ran += 1;
        match tokio::task::spawn_blocking(callback).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => sink.report(&err),
            Err(err) => sink.report(&anyhow!(join_error_message(err))),
        }
    }

    debug!(callbacks = ran, "defer queue drained");
}
