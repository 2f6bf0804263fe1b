// tests/defer_queue.rs

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::anyhow;

use boundrun::exec::{error_sink, set_error_sink, DeferQueue, ErrorSink};
use boundrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Collects reported errors so tests can inspect them.
#[derive(Default)]
struct RecordingSink {
    errors: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, error: &anyhow::Error) {
        self.errors.lock().unwrap().push(format!("{error:#}"));
    }
}

#[tokio::test]
async fn callbacks_run_in_fifo_order() -> TestResult {
    init_tracing();

    let order: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let queue = DeferQueue::with_sink(Arc::new(RecordingSink::default()));

    for i in 0..20 {
        let order = Arc::clone(&order);
        queue.defer(move || {
            // Earlier callbacks sleep longer; order must still hold.
            std::thread::sleep(Duration::from_millis((20 - i as u64) / 4));
            order.lock().unwrap().push(i);
            Ok(())
        });
    }

    with_timeout(queue.flush()).await;

    let order = order.lock().unwrap().clone();
    assert_eq!(order, (0..20).collect::<Vec<_>>());

    Ok(())
}

#[tokio::test]
async fn defer_does_not_block_the_caller() -> TestResult {
    init_tracing();

    let queue = DeferQueue::with_sink(Arc::new(RecordingSink::default()));

    let start = Instant::now();
    queue.defer(|| {
        std::thread::sleep(Duration::from_millis(200));
        Ok(())
    });
    assert!(
        start.elapsed() < Duration::from_millis(100),
        "defer must return immediately"
    );

    with_timeout(queue.flush()).await;
    assert!(start.elapsed() >= Duration::from_millis(200));

    Ok(())
}

#[tokio::test]
async fn errors_and_panics_go_to_the_sink() -> TestResult {
    init_tracing();

    let sink = Arc::new(RecordingSink::default());
    let ran_after: Arc<Mutex<bool>> = Arc::new(Mutex::new(false));

    let queue = DeferQueue::with_sink(sink.clone());
    queue.defer(|| Err(anyhow!("cleanup failed")));
    queue.defer(|| panic!("callback exploded"));
    {
        let ran_after = Arc::clone(&ran_after);
        queue.defer(move || {
            *ran_after.lock().unwrap() = true;
            Ok(())
        });
    }

    with_timeout(queue.flush()).await;

    let errors = sink.errors();
    assert_eq!(errors.len(), 2, "got: {errors:?}");
    assert_eq!(errors[0], "cleanup failed");
    assert!(errors[1].contains("callback exploded"), "got: {}", errors[1]);
    assert!(
        *ran_after.lock().unwrap(),
        "a failing callback must not stop later ones"
    );

    Ok(())
}

#[tokio::test]
async fn process_wide_sink_is_installed_once() -> TestResult {
    init_tracing();

    let sink = Arc::new(RecordingSink::default());
    set_error_sink(sink.clone())?;
    assert!(
        set_error_sink(Arc::new(RecordingSink::default())).is_err(),
        "second install must be rejected"
    );

    // `start()` picks up the installed sink.
    let queue = DeferQueue::start();
    queue.defer(|| Err(anyhow!("reported globally")));
    with_timeout(queue.flush()).await;

    assert_eq!(sink.errors(), vec!["reported globally".to_string()]);

    error_sink().report(&anyhow!("direct"));
    assert_eq!(sink.errors().len(), 2);

    Ok(())
}

#[tokio::test]
async fn flush_on_empty_queue_returns() -> TestResult {
    init_tracing();

    let queue = DeferQueue::with_sink(Arc::new(RecordingSink::default()));
    with_timeout(queue.flush()).await;

    Ok(())
}
