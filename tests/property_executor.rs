// tests/property_executor.rs

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use boundrun::config::ExecutorConfig;
use boundrun::exec::{run, TaskFn};
use boundrun::{TaskFailure, TaskOutcome};
use boundrun_test_utils::{failing_task, sleeping_task, ConcurrencyProbe};

// Each task is (sleep ms, should fail).
fn task_plan_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<(u64, bool)>> {
    proptest::collection::vec((0..15u64, any::<bool>()), 0..=max_tasks)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_task_gets_exactly_one_outcome_within_the_cap(
        plan in task_plan_strategy(24),
        limit in 1..6usize,
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let probe = ConcurrencyProbe::new();
        let failing: HashSet<usize> = plan
            .iter()
            .enumerate()
            .filter(|(_, (_, fail))| *fail)
            .map(|(i, _)| i)
            .collect();

        let tasks: HashMap<usize, TaskFn<usize>> = plan
            .iter()
            .enumerate()
            .map(|(i, &(ms, fail))| {
                let body = if fail {
                    failing_task(&probe, ms, &format!("task {i} failed"))
                } else {
                    sleeping_task(&probe, ms, i)
                };
                (i, body)
            })
            .collect();

        let results = rt.block_on(run(tasks, ExecutorConfig::new(limit))).unwrap();

        prop_assert_eq!(results.len(), plan.len());
        prop_assert!(probe.peak() <= limit, "peak {} > limit {}", probe.peak(), limit);
        prop_assert_eq!(probe.started(), plan.len());

        for i in 0..plan.len() {
            let outcome = results.get(&i).cloned();
            let expected = if failing.contains(&i) {
                TaskOutcome::Failure(TaskFailure::Task(format!("task {i} failed")))
            } else {
                // Siblings failing never affects a succeeding task.
                TaskOutcome::Success(i)
            };
            prop_assert_eq!(outcome, Some(expected));
        }

        let summary = results.summary();
        prop_assert_eq!(summary.failed, failing.len());
        prop_assert_eq!(summary.succeeded, plan.len() - failing.len());
        prop_assert_eq!(summary.timed_out + summary.cancelled, 0);
    }
}
