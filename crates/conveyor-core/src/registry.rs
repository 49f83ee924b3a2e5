use std::collections::BTreeMap;
use std::sync::Arc;

use crate::execution::ProcessExecutor;
use crate::models::{CoreError, CoreErrorKind, CoreResult};
use crate::tasks::{CommandTask, LogTask, TaskImplementation};

/// Task implementations keyed by the `task` designator they handle.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    implementations: BTreeMap<String, Arc<dyn TaskImplementation>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `command` and `log` implementations.
    pub fn with_builtins(executor: Arc<dyn ProcessExecutor>) -> CoreResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(CommandTask::new(executor)?))?;
        registry.register(Arc::new(LogTask))?;
        Ok(registry)
    }

    pub fn register(&mut self, implementation: Arc<dyn TaskImplementation>) -> CoreResult<()> {
        let kind = implementation.kind();
        if self.implementations.contains_key(kind) {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("task implementation '{kind}' is already registered"),
            ));
        }

        self.implementations.insert(kind.to_string(), implementation);
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn TaskImplementation>> {
        self.implementations.get(kind).cloned()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.implementations.keys().map(String::as_str)
    }
}
