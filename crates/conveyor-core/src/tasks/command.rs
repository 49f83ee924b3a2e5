use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::execution::{CommandSpec, ProcessExecutor, ProcessExit, ProcessRequest, run_validated};
use crate::models::{CoreError, CoreErrorKind, CoreResult, TaskConfig};
use crate::tasks::{TaskImplementation, invalid_field, scalar_to_string};

const CLEANUP_KEY: &str = "cleanup";

/// Runs an external program.
///
/// Fields: `program`, `args`, `env`, `working_dir`, `timeout_secs`, and an
/// optional `cleanup` table with the same keys describing the cleanup command.
pub struct CommandTask {
    executor: Arc<dyn ProcessExecutor>,
    runtime: tokio::runtime::Runtime,
}

impl CommandTask {
    pub const KIND: &'static str = "command";

    pub fn new(executor: Arc<dyn ProcessExecutor>) -> CoreResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                CoreError::new(
                    CoreErrorKind::Internal,
                    format!("failed to build process runtime: {error}"),
                )
            })?;

        Ok(Self { executor, runtime })
    }

    fn execute(&self, task: &TaskConfig, invocation: Invocation) -> CoreResult<()> {
        let identity = task.identity();
        let mut request = ProcessRequest::new(identity, invocation.command);
        if let Some(timeout) = invocation.timeout {
            request = request.timeout(timeout);
        }

        let output = self
            .runtime
            .block_on(run_validated(self.executor.as_ref(), request))?;
        tracing::debug!(
            task = %identity,
            elapsed_ms = output.elapsed.as_millis() as u64,
            stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
            "process finished"
        );

        if output.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match output.exit {
            ProcessExit::Code(code) => format!("process exited with code {code}"),
            ProcessExit::Signal => "process was killed by a signal".to_string(),
        };
        let message = match stderr.trim_end() {
            "" => message,
            stderr => format!("{message}: {stderr}"),
        };

        Err(CoreError::new(CoreErrorKind::ProcessFailure, message).for_task(identity))
    }
}

impl TaskImplementation for CommandTask {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn run(&self, task: &TaskConfig) -> CoreResult<()> {
        let invocation = Invocation::from_fields(task, &task.fields, "")?;
        self.execute(task, invocation)
    }

    fn cleanup(&self, task: &TaskConfig) -> CoreResult<()> {
        match task.field(CLEANUP_KEY) {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Object(fields)) => {
                let invocation = Invocation::from_fields(task, fields, "cleanup.")?;
                self.execute(task, invocation)
            }
            Some(_) => Err(invalid_field(task, CLEANUP_KEY, "a table")),
        }
    }
}

#[derive(Debug)]
struct Invocation {
    command: CommandSpec,
    timeout: Option<Duration>,
}

impl Invocation {
    /// `prefix` qualifies field names in error messages.
    fn from_fields(
        task: &TaskConfig,
        fields: &Map<String, Value>,
        prefix: &str,
    ) -> CoreResult<Self> {
        let key = |name: &str| format!("{prefix}{name}");

        let program = fields
            .get("program")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_field(task, &key("program"), "a string"))?;
        let mut command = CommandSpec::new(program);

        match fields.get("args") {
            None | Some(Value::Null) => {}
            Some(Value::String(line)) => {
                command = command.args(line.split_whitespace());
            }
            Some(Value::Array(items)) => {
                let args = items
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| invalid_field(task, &key("args"), "a list of scalars"))?;
                command = command.args(args);
            }
            Some(_) => return Err(invalid_field(task, &key("args"), "a list or a string")),
        }

        match fields.get("env") {
            None | Some(Value::Null) => {}
            Some(Value::Object(env)) => {
                for (name, value) in env {
                    let value = scalar_to_string(value)
                        .ok_or_else(|| invalid_field(task, &key("env"), "a table of scalars"))?;
                    command = command.env(name.clone(), value);
                }
            }
            Some(_) => return Err(invalid_field(task, &key("env"), "a table")),
        }

        match fields.get("working_dir") {
            None | Some(Value::Null) => {}
            Some(Value::String(dir)) => command = command.working_dir(dir),
            Some(_) => return Err(invalid_field(task, &key("working_dir"), "a string")),
        }

        let timeout = match fields.get("timeout_secs") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let timeout = match value {
                    Value::Number(number) => number.as_f64(),
                    Value::String(text) => text.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|seconds| *seconds > 0.0)
                .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
                .ok_or_else(|| invalid_field(task, &key("timeout_secs"), "a positive number"))?;
                Some(timeout)
            }
        };

        Ok(Self { command, timeout })
    }
}
