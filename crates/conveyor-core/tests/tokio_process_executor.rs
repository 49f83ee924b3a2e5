#![cfg(unix)]

use std::time::{Duration, Instant};

use conveyor_core::execution::{
    CommandSpec, ProcessExit, ProcessRequest, TokioProcessExecutor, run_validated,
};
use conveyor_core::models::CoreErrorKind;
use tempfile::TempDir;

fn shell(task: &str, script: &str) -> ProcessRequest {
    ProcessRequest::new(task, CommandSpec::new("/bin/sh").args(["-c", script]))
}

#[tokio::test]
async fn captures_stdout_and_stderr_separately() {
    let output = run_validated(&TokioProcessExecutor, shell("greet", "echo out; echo err >&2"))
        .await
        .unwrap();

    assert!(output.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
    assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
}

#[tokio::test]
async fn reports_the_exit_code() {
    let output = run_validated(&TokioProcessExecutor, shell("fail", "exit 3"))
        .await
        .unwrap();

    assert_eq!(output.exit, ProcessExit::Code(3));
    assert!(!output.success());
}

#[tokio::test]
async fn signalled_process_has_no_exit_code() {
    let output = run_validated(&TokioProcessExecutor, shell("doomed", "kill -9 $$"))
        .await
        .unwrap();

    assert_eq!(output.exit, ProcessExit::Signal);
}

#[tokio::test]
async fn timeout_kills_the_whole_process_group() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("survivor");
    let script = format!("(sleep 1; touch '{}') & sleep 30", marker.display());
    let request = shell("nap", &script).timeout(Duration::from_millis(200));
    let started = Instant::now();

    let error = run_validated(&TokioProcessExecutor, request).await.unwrap_err();

    assert_eq!(error.kind, CoreErrorKind::Timeout);
    assert_eq!(error.task.as_deref(), Some("nap"));
    assert!(started.elapsed() < Duration::from_secs(10));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists(), "background child outlived the timeout");
}

#[tokio::test]
async fn env_and_working_dir_reach_the_child() {
    let dir = TempDir::new().unwrap();
    let request = ProcessRequest::new(
        "env",
        CommandSpec::new("/bin/sh")
            .args(["-c", "echo \"$CONVEYOR_STAGE\"; pwd"])
            .env("CONVEYOR_STAGE", "nightly")
            .working_dir(dir.path()),
    );

    let output = run_validated(&TokioProcessExecutor, request).await.unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "nightly");
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(std::path::Path::new(lines[1]).canonicalize().unwrap(), expected);
}

#[tokio::test]
async fn missing_program_is_a_process_failure() {
    let request = ProcessRequest::new("ghost", CommandSpec::new("/nonexistent/binary"));

    let error = run_validated(&TokioProcessExecutor, request).await.unwrap_err();

    assert_eq!(error.kind, CoreErrorKind::ProcessFailure);
    assert_eq!(error.task.as_deref(), Some("ghost"));
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_spawning() {
    let cases = [
        shell("zero", "true").timeout(Duration::ZERO),
        ProcessRequest::new("empty", CommandSpec::new("")),
        ProcessRequest::new("env", CommandSpec::new("/bin/true").env("A=B", "1")),
    ];

    for request in cases {
        let task = request.task.clone();
        let error = run_validated(&TokioProcessExecutor, request).await.unwrap_err();

        assert_eq!(error.kind, CoreErrorKind::InvalidInput, "{task}");
        assert_eq!(error.task.as_deref(), Some(task.as_str()));
    }
}
