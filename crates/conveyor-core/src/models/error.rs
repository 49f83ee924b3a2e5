use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    LoadFailure,
    ParseFailure,
    DuplicateNamespace,
    VariableNotFound,
    NotATask,
    MalformedRedefinition,
    NoMatchingTask,
    PathLookup,
    UnknownTask,
    InvalidInput,
    Timeout,
    ProcessFailure,
    TaskFailure,
    Internal,
}

/// Error raised by the core.
///
/// `namespace` and `task` attribute the error to the source unit and the task
/// configuration it concerns, when known.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub namespace: Option<String>,
    pub task: Option<String>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            namespace: None,
            task: None,
            kind,
            message: message.into(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn for_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }
}
