pub mod tokio_process;

pub use tokio_process::TokioProcessExecutor;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use crate::models::{CoreError, CoreErrorKind, CoreResult};

pub type ProcessFuture = Pin<Box<dyn Future<Output = CoreResult<ProcessOutput>> + Send>>;

/// Program, arguments and environment of one external process.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }
}

/// A command to run on behalf of a pipeline task.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessRequest {
    /// Identity of the task, used to attribute errors.
    pub task: String,
    pub command: CommandSpec,
    pub timeout: Option<Duration>,
}

impl ProcessRequest {
    pub fn new(task: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            task: task.into(),
            command,
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Rejects requests the OS would refuse or that could never finish.
    pub fn validate(&self) -> CoreResult<()> {
        let command = &self.command;
        let problem = if command.program.as_os_str().is_empty() {
            Some("program path must not be empty")
        } else if command.args.iter().any(|arg| arg.contains('\0')) {
            Some("arguments must not contain NUL bytes")
        } else if command.env.iter().any(|(key, value)| {
            key.is_empty() || key.contains(['=', '\0']) || value.contains('\0')
        }) {
            Some("environment names must be non-empty and free of '=' and NUL bytes")
        } else if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            Some("timeout must be greater than zero")
        } else {
            None
        };

        match problem {
            Some(message) => Err(CoreError::new(CoreErrorKind::InvalidInput, message)
                .for_task(self.task.as_str())),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessExit {
    Code(i32),
    /// Ended by a signal without an exit code.
    Signal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessOutput {
    pub exit: ProcessExit,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit == ProcessExit::Code(0)
    }
}

/// Runs external processes to completion.
pub trait ProcessExecutor: Send + Sync {
    /// The returned future must be polled inside a tokio runtime.
    fn run(&self, request: ProcessRequest) -> ProcessFuture;
}

/// Validates `request` before handing it to `executor`.
pub fn run_validated(executor: &dyn ProcessExecutor, request: ProcessRequest) -> ProcessFuture {
    match request.validate() {
        Ok(()) => executor.run(request),
        Err(error) => Box::pin(std::future::ready(Err(error))),
    }
}
