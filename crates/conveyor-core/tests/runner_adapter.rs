use std::sync::Mutex;

use conveyor_core::engine::ExecutionEngine;
use conveyor_core::models::{
    CleanupMode, ConfigStore, CoreErrorKind, ExecutionFailure, RunReport, TaskConfig, TaskFailure,
};
use conveyor_core::runner::run_pipeline;

struct FakeEngine {
    captured: Mutex<Option<(Vec<TaskConfig>, CleanupMode)>>,
    outcome: Result<RunReport, ExecutionFailure>,
}

impl FakeEngine {
    fn new(outcome: Result<RunReport, ExecutionFailure>) -> Self {
        Self {
            captured: Mutex::new(None),
            outcome,
        }
    }

    fn captured(&self) -> Option<(Vec<TaskConfig>, CleanupMode)> {
        self.captured.lock().ok()?.clone()
    }
}

impl ExecutionEngine for FakeEngine {
    fn run(
        &self,
        tasks: &[TaskConfig],
        cleanup: CleanupMode,
    ) -> Result<RunReport, ExecutionFailure> {
        if let Ok(mut slot) = self.captured.lock() {
            *slot = Some((tasks.to_vec(), cleanup));
        }
        self.outcome.clone()
    }
}

fn failure(position: usize, task: &str, kind: CoreErrorKind, message: &str) -> TaskFailure {
    TaskFailure {
        position,
        task: task.to_string(),
        kind,
        message: message.to_string(),
    }
}

#[test]
fn pipeline_and_cleanup_mode_are_passed_through_unchanged() {
    let mut store = ConfigStore::new();
    let fetch = store.insert(TaskConfig::new("command").with_name("fetch"));
    let report = store.insert(TaskConfig::new("log"));
    let engine = FakeEngine::new(Ok(RunReport {
        executed: 3,
        cleaned: 0,
    }));

    for mode in CleanupMode::ALL {
        let result = run_pipeline(&engine, &store, &[report, fetch, report], mode);

        assert!(result.is_ok());
        let (tasks, captured_mode) = engine.captured().expect("engine should be called");
        assert_eq!(captured_mode, mode);
        let identities: Vec<&str> = tasks.iter().map(TaskConfig::identity).collect();
        assert_eq!(identities, vec!["log", "fetch", "log"]);
    }
}

#[test]
fn engine_failure_is_returned_with_engine_order_preserved() {
    let store = ConfigStore::new();
    let expected = ExecutionFailure {
        run_failures: vec![failure(2, "fetch", CoreErrorKind::ProcessFailure, "exit 3")],
        cleanup_failures: vec![
            failure(1, "parse", CoreErrorKind::TaskFailure, "busy"),
            failure(0, "prepare", CoreErrorKind::Timeout, "slow"),
        ],
    };
    let engine = FakeEngine::new(Err(expected.clone()));

    let returned = run_pipeline(&engine, &store, &[], CleanupMode::Always).unwrap_err();

    assert_eq!(returned, expected);
    assert_eq!(
        returned.rendered_lines(),
        vec![
            "run #3 fetch: ProcessFailure: exit 3",
            "cleanup #2 parse: TaskFailure: busy",
            "cleanup #1 prepare: Timeout: slow",
        ]
    );
}

#[test]
fn failure_summary_lists_every_record() {
    let summary = ExecutionFailure {
        run_failures: vec![failure(0, "fetch", CoreErrorKind::UnknownTask, "no such task")],
        cleanup_failures: Vec::new(),
    }
    .to_string();

    assert_eq!(
        summary,
        "pipeline failed with 1 run failure(s) and 0 cleanup failure(s)\n  run #1 fetch: UnknownTask: no such task"
    );
}
