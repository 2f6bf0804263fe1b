use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use boundrun::exec::{task, TaskFn};

/// Tracks how many probed tasks are active at once.
///
/// Clone it into every task body; call [`ConcurrencyProbe::enter`] at the
/// start of the body and keep the guard alive until the body is done. The
/// guard also leaves on drop, so aborted bodies are accounted for.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

pub struct ProbeGuard {
    probe: ConcurrencyProbe,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> ProbeGuard {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ProbeGuard {
            probe: self.clone(),
        }
    }

    /// Highest number of simultaneously active bodies seen so far.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of bodies that started.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of bodies that ran to the end without being interrupted.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl ProbeGuard {
    /// Mark the body as having run to completion.
    pub fn complete(self) {
        self.probe.finished.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.probe.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A task that sleeps for `ms` milliseconds under `probe` and returns `value`.
pub fn sleeping_task<V>(probe: &ConcurrencyProbe, ms: u64, value: V) -> TaskFn<V>
where
    V: Send + 'static,
{
    let probe = probe.clone();
    task(move || async move {
        let guard = probe.enter();
        tokio::time::sleep(Duration::from_millis(ms)).await;
        guard.complete();
        Ok(value)
    })
}

/// A task that fails with `message` after sleeping `ms` milliseconds.
pub fn failing_task<V>(probe: &ConcurrencyProbe, ms: u64, message: &str) -> TaskFn<V>
where
    V: Send + 'static,
{
    let probe = probe.clone();
    let message = message.to_string();
    task(move || async move {
        let guard = probe.enter();
        tokio::time::sleep(Duration::from_millis(ms)).await;
        guard.complete();
        Err(anyhow!(message))
    })
}
