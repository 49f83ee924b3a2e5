pub mod command;
pub mod log;

pub use command::CommandTask;
pub use log::LogTask;

use serde_json::Value;

use crate::models::{CoreError, CoreErrorKind, CoreResult, TaskConfig};

/// A task implementation the engine dispatches configurations to by their
/// `task_type`.
pub trait TaskImplementation: Send + Sync {
    fn kind(&self) -> &'static str;

    fn run(&self, task: &TaskConfig) -> CoreResult<()>;

    fn cleanup(&self, _task: &TaskConfig) -> CoreResult<()> {
        Ok(())
    }
}

/// Renders a scalar field value as a string. Redefinitions always produce
/// strings, so fields typed as numbers in a source unit may arrive either way.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn invalid_field(task: &TaskConfig, key: &str, expected: &str) -> CoreError {
    CoreError::new(
        CoreErrorKind::InvalidInput,
        format!(
            "{} task '{}' field '{key}' must be {expected}",
            task.task_type,
            task.identity()
        ),
    )
    .for_task(task.identity())
}
