//! `conveyor`: resolve task configurations from source units, assemble them
//! into a pipeline, apply redefinitions and run it.
//!
//! ```bash
//! conveyor -f base.toml -f nightly.json -r fetch.retry.count=5 nightly.stages report
//! ```

mod args;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use conveyor_core::engine::PipelineEngine;
use conveyor_core::execution::TokioProcessExecutor;
use conveyor_core::models::{ConfigStore, CoreError, ExecutionFailure};
use conveyor_core::namespace::NamespaceSet;
use conveyor_core::pipeline::{apply_redefinitions, assemble};
use conveyor_core::registry::TaskRegistry;
use conveyor_core::runner::run_pipeline;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::args::Cli;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = logging::init(cli.log_level, !cli.no_timestamps) {
        eprintln!("conveyor: {error:#}");
        return ExitCode::FAILURE;
    }

    let started = OffsetDateTime::now_utc();
    tracing::info!(started_at = %rfc3339(started), "conveyor starting");

    let outcome = run(&cli);

    let finished = OffsetDateTime::now_utc();
    tracing::info!(
        finished_at = %rfc3339(finished),
        elapsed = %(finished - started),
        "conveyor finished"
    );

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut store = ConfigStore::new();
    let namespaces = NamespaceSet::load(&cli.files, &mut store)?;
    let pipeline = assemble(&cli.tasks, &namespaces)?;
    apply_redefinitions(&pipeline, &mut store, &cli.redefinitions)?;

    if cli.dry_run {
        let tasks = store.snapshot(&pipeline)?;
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    let registry = TaskRegistry::with_builtins(Arc::new(TokioProcessExecutor))?;
    let engine = PipelineEngine::new(registry);
    run_pipeline(&engine, &store, &pipeline, cli.cleanup.into())?;
    Ok(())
}

fn report(error: &anyhow::Error) {
    if already_reported(error) {
        return;
    }

    match error.downcast_ref::<CoreError>() {
        Some(core) => tracing::error!(
            namespace = core.namespace.as_deref().unwrap_or("-"),
            task = core.task.as_deref().unwrap_or("-"),
            "{core}"
        ),
        None => tracing::error!("{error:#}"),
    }
}

/// `run_pipeline` logs every record of an execution failure itself.
fn already_reported(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ExecutionFailure>().is_some()
}

fn rfc3339(moment: OffsetDateTime) -> String {
    moment
        .format(&Rfc3339)
        .unwrap_or_else(|_| moment.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use conveyor_core::models::{CoreErrorKind, TaskFailure};

    use super::*;

    #[test]
    fn execution_failures_are_not_reported_twice() {
        let failure = ExecutionFailure {
            run_failures: vec![TaskFailure {
                position: 0,
                task: "fetch".to_string(),
                kind: CoreErrorKind::ProcessFailure,
                message: "process exited with code 1".to_string(),
            }],
            cleanup_failures: Vec::new(),
        };

        assert!(already_reported(&anyhow::Error::new(failure)));
    }

    #[test]
    fn core_errors_are_reported_by_the_binary() {
        let error = CoreError::new(CoreErrorKind::VariableNotFound, "variable 'x' not found");

        assert!(!already_reported(&anyhow::Error::new(error)));
    }
}
