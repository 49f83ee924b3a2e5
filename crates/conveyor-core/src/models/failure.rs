use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::models::{CoreError, CoreErrorKind, TaskConfig};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FailurePhase {
    Run,
    Cleanup,
}

impl FailurePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Cleanup => "cleanup",
        }
    }
}

/// A failure reported by the execution engine for one task.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskFailure {
    /// Zero-based position of the task in the pipeline.
    pub position: usize,
    pub task: String,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl TaskFailure {
    pub fn from_error(position: usize, config: &TaskConfig, error: CoreError) -> Self {
        Self {
            position,
            task: config.identity().to_string(),
            kind: error.kind,
            message: error.message,
        }
    }

    pub fn render(&self, phase: FailurePhase) -> String {
        format!(
            "{} #{} {}: {:?}: {}",
            phase.as_str(),
            self.position + 1,
            self.task,
            self.kind,
            self.message
        )
    }
}

/// Aggregated failure of a pipeline run.
///
/// Both lists keep the order the engine reported them in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExecutionFailure {
    pub run_failures: Vec<TaskFailure>,
    pub cleanup_failures: Vec<TaskFailure>,
}

impl ExecutionFailure {
    pub fn is_empty(&self) -> bool {
        self.run_failures.is_empty() && self.cleanup_failures.is_empty()
    }

    /// One line per failure, run phase first.
    pub fn rendered_lines(&self) -> Vec<String> {
        self.run_failures
            .iter()
            .map(|failure| failure.render(FailurePhase::Run))
            .chain(
                self.cleanup_failures
                    .iter()
                    .map(|failure| failure.render(FailurePhase::Cleanup)),
            )
            .collect()
    }
}

impl Display for ExecutionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pipeline failed with {} run failure(s) and {} cleanup failure(s)",
            self.run_failures.len(),
            self.cleanup_failures.len()
        )?;
        for line in self.rendered_lines() {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

impl Error for ExecutionFailure {}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunReport {
    pub executed: usize,
    pub cleaned: usize,
}
