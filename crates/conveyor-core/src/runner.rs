use crate::engine::ExecutionEngine;
use crate::models::{
    CleanupMode, ConfigId, ConfigStore, CoreError, ExecutionFailure, FailurePhase, RunReport,
    TaskFailure,
};

pub type RunResult = Result<RunReport, ExecutionFailure>;

/// Hands the pipeline to `engine` and reports any failure it returns.
///
/// The cleanup mode is passed through untouched. Failures are logged run
/// phase first, each list in the order the engine reported it.
pub fn run_pipeline(
    engine: &dyn ExecutionEngine,
    store: &ConfigStore,
    pipeline: &[ConfigId],
    cleanup: CleanupMode,
) -> RunResult {
    let tasks = store.snapshot(pipeline).map_err(internal_failure)?;

    tracing::info!(tasks = tasks.len(), cleanup = %cleanup, "starting pipeline");

    match engine.run(&tasks, cleanup) {
        Ok(report) => {
            tracing::info!(
                executed = report.executed,
                cleaned = report.cleaned,
                "pipeline finished"
            );
            Ok(report)
        }
        Err(failure) => {
            report_failure(&failure);
            Err(failure)
        }
    }
}

pub fn report_failure(failure: &ExecutionFailure) {
    tracing::error!(
        run_failures = failure.run_failures.len(),
        cleanup_failures = failure.cleanup_failures.len(),
        "pipeline failed"
    );
    for (phase, failures) in [
        (FailurePhase::Run, &failure.run_failures),
        (FailurePhase::Cleanup, &failure.cleanup_failures),
    ] {
        for record in failures {
            tracing::error!(
                phase = phase.as_str(),
                position = record.position + 1,
                task = %record.task,
                kind = ?record.kind,
                "{}",
                record.message
            );
        }
    }
}

fn internal_failure(error: CoreError) -> ExecutionFailure {
    ExecutionFailure {
        run_failures: vec![TaskFailure {
            position: 0,
            task: error.task.unwrap_or_default(),
            kind: error.kind,
            message: error.message,
        }],
        cleanup_failures: Vec::new(),
    }
}
