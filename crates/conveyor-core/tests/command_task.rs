#![cfg(unix)]

use std::fs;
use std::sync::Arc;

use conveyor_core::engine::{ExecutionEngine, PipelineEngine};
use conveyor_core::execution::TokioProcessExecutor;
use conveyor_core::models::{CleanupMode, ConfigStore, CoreErrorKind, TaskConfig};
use conveyor_core::pipeline::apply_redefinitions;
use conveyor_core::registry::TaskRegistry;
use serde_json::json;
use tempfile::TempDir;

fn builtin_engine() -> PipelineEngine {
    let registry = TaskRegistry::with_builtins(Arc::new(TokioProcessExecutor)).unwrap();
    PipelineEngine::new(registry)
}

#[test]
fn builtins_are_registered() {
    let engine = builtin_engine();

    assert_eq!(
        engine.registry().kinds().collect::<Vec<_>>(),
        vec!["command", "log"]
    );
}

#[test]
fn command_and_cleanup_run_in_order() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("marker");
    let marker_path = marker.display().to_string();
    let task = TaskConfig::new("command")
        .with_name("touch")
        .with_field("program", "/bin/sh")
        .with_field("args", json!(["-c", format!("echo run >> {marker_path}")]))
        .with_field(
            "cleanup",
            json!({"program": "/bin/sh", "args": ["-c", format!("echo clean >> {marker_path}")]}),
        );

    let report = builtin_engine()
        .run(&[task], CleanupMode::Always)
        .unwrap();

    assert_eq!(report.executed, 1);
    assert_eq!(fs::read_to_string(&marker).unwrap(), "run\nclean\n");
}

#[test]
fn nonzero_exit_is_reported_as_process_failure() {
    let task = TaskConfig::new("command")
        .with_name("broken")
        .with_field("program", "/bin/sh")
        .with_field("args", json!(["-c", "echo oops >&2; exit 4"]));

    let failure = builtin_engine()
        .run(&[task], CleanupMode::Never)
        .unwrap_err();

    assert_eq!(failure.run_failures.len(), 1);
    let record = &failure.run_failures[0];
    assert_eq!(record.task, "broken");
    assert_eq!(record.kind, CoreErrorKind::ProcessFailure);
    assert!(record.message.contains("code 4"), "{}", record.message);
    assert!(record.message.contains("oops"), "{}", record.message);
}

#[test]
fn string_timeout_from_a_redefinition_is_honoured() {
    let task = TaskConfig::new("command")
        .with_field("program", "/bin/sleep")
        .with_field("args", "5")
        .with_field("timeout_secs", "0.1");

    let failure = builtin_engine()
        .run(&[task], CleanupMode::Never)
        .unwrap_err();

    assert_eq!(failure.run_failures[0].kind, CoreErrorKind::Timeout);
}

#[test]
fn oversized_timeout_from_a_redefinition_is_a_task_failure() {
    let mut store = ConfigStore::new();
    let id = store.insert(
        TaskConfig::new("command")
            .with_name("fetch")
            .with_field("program", "/bin/true"),
    );
    apply_redefinitions(&[id], &mut store, &["fetch.timeout_secs=1e30"]).unwrap();
    let tasks = store.snapshot(&[id]).unwrap();

    let failure = builtin_engine()
        .run(&tasks, CleanupMode::Never)
        .unwrap_err();

    assert_eq!(failure.run_failures.len(), 1);
    assert_eq!(failure.run_failures[0].kind, CoreErrorKind::InvalidInput);
    assert!(
        failure.run_failures[0].message.contains("timeout_secs"),
        "{}",
        failure.run_failures[0].message
    );
}

#[test]
fn log_task_rejects_unknown_levels() {
    let task = TaskConfig::new("log")
        .with_field("message", "hello")
        .with_field("level", "loud");

    let failure = builtin_engine()
        .run(&[task], CleanupMode::Never)
        .unwrap_err();

    assert_eq!(failure.run_failures[0].kind, CoreErrorKind::InvalidInput);
}
