use std::sync::Arc;

use crate::models::{
    CleanupMode, CoreError, CoreErrorKind, ExecutionFailure, RunReport, TaskConfig, TaskFailure,
};
use crate::registry::TaskRegistry;
use crate::tasks::TaskImplementation;

/// Runs an assembled pipeline.
pub trait ExecutionEngine {
    fn run(
        &self,
        tasks: &[TaskConfig],
        cleanup: CleanupMode,
    ) -> Result<RunReport, ExecutionFailure>;
}

/// In-process engine dispatching each task to its registered implementation.
///
/// Tasks run in order and the run phase stops at the first failure. Cleanup
/// covers every task whose run was attempted, in reverse order, except in
/// `pronto` mode where each task is cleaned up right after its own run.
pub struct PipelineEngine {
    registry: TaskRegistry,
}

impl PipelineEngine {
    pub fn new(registry: TaskRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }
}

struct Attempted<'a> {
    position: usize,
    task: &'a TaskConfig,
    implementation: Arc<dyn TaskImplementation>,
}

impl ExecutionEngine for PipelineEngine {
    fn run(
        &self,
        tasks: &[TaskConfig],
        cleanup: CleanupMode,
    ) -> Result<RunReport, ExecutionFailure> {
        let mut report = RunReport::default();
        let mut failure = ExecutionFailure::default();
        let mut attempted = Vec::new();

        for (position, task) in tasks.iter().enumerate() {
            let Some(implementation) = self.registry.get(&task.task_type) else {
                let error = CoreError::new(
                    CoreErrorKind::UnknownTask,
                    format!("no task implementation named '{}'", task.task_type),
                );
                failure
                    .run_failures
                    .push(TaskFailure::from_error(position, task, error));
                break;
            };

            tracing::info!(
                position = position + 1,
                total = tasks.len(),
                task = %task.identity(),
                kind = %task.task_type,
                "running task"
            );
            let outcome = implementation.run(task);
            report.executed += 1;

            let entry = Attempted {
                position,
                task,
                implementation,
            };
            if cleanup == CleanupMode::Pronto {
                clean(&entry, &mut report, &mut failure);
            } else {
                attempted.push(entry);
            }

            if let Err(error) = outcome {
                failure
                    .run_failures
                    .push(TaskFailure::from_error(position, task, error));
                break;
            }
        }

        let run_succeeded = failure.run_failures.is_empty();
        let clean_now = match cleanup {
            CleanupMode::Always => true,
            CleanupMode::Never | CleanupMode::Pronto => false,
            CleanupMode::OnSuccess => run_succeeded,
            CleanupMode::OnFailure => !run_succeeded,
        };

        if clean_now {
            for entry in attempted.iter().rev() {
                clean(entry, &mut report, &mut failure);
            }
        }

        if failure.is_empty() {
            Ok(report)
        } else {
            Err(failure)
        }
    }
}

fn clean(entry: &Attempted<'_>, report: &mut RunReport, failure: &mut ExecutionFailure) {
    tracing::debug!(
        position = entry.position + 1,
        task = %entry.task.identity(),
        "cleaning up task"
    );
    report.cleaned += 1;
    if let Err(error) = entry.implementation.cleanup(entry.task) {
        failure
            .cleanup_failures
            .push(TaskFailure::from_error(entry.position, entry.task, error));
    }
}
