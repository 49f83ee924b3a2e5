use crate::models::{CoreResult, TaskConfig};
use crate::tasks::{TaskImplementation, invalid_field};

/// Emits the configured `message` at the configured `level`.
pub struct LogTask;

impl LogTask {
    pub const KIND: &'static str = "log";
}

impl TaskImplementation for LogTask {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn run(&self, task: &TaskConfig) -> CoreResult<()> {
        let message = match task.field("message") {
            None => "",
            Some(value) => value
                .as_str()
                .ok_or_else(|| invalid_field(task, "message", "a string"))?,
        };
        let level = match task.field("level") {
            None => "info",
            Some(value) => value
                .as_str()
                .ok_or_else(|| invalid_field(task, "level", "a string"))?,
        };
        let identity = task.identity();

        match level.to_ascii_lowercase().as_str() {
            "trace" => tracing::trace!(task = %identity, "{message}"),
            "debug" => tracing::debug!(task = %identity, "{message}"),
            "info" => tracing::info!(task = %identity, "{message}"),
            "warn" | "warning" => tracing::warn!(task = %identity, "{message}"),
            "error" => tracing::error!(task = %identity, "{message}"),
            _ => {
                return Err(invalid_field(
                    task,
                    "level",
                    "one of trace, debug, info, warn, error",
                ));
            }
        }

        Ok(())
    }
}
