pub mod cleanup;
pub mod error;
pub mod failure;
pub mod task;

pub use cleanup::CleanupMode;
pub use error::{CoreError, CoreErrorKind, CoreResult};
pub use failure::{ExecutionFailure, FailurePhase, RunReport, TaskFailure};
pub use task::{ConfigId, ConfigStore, TaskConfig};
