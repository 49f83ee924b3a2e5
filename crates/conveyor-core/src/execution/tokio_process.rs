use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;

use crate::execution::{ProcessExecutor, ProcessExit, ProcessFuture, ProcessOutput, ProcessRequest};
use crate::models::{CoreError, CoreErrorKind, CoreResult};

/// Runs processes with `tokio::process`, capturing their output.
///
/// On unix each child leads its own process group, and a timeout kills the
/// whole group so nothing the task started outlives it.
pub struct TokioProcessExecutor;

impl ProcessExecutor for TokioProcessExecutor {
    fn run(&self, request: ProcessRequest) -> ProcessFuture {
        Box::pin(run_process(request))
    }
}

async fn run_process(request: ProcessRequest) -> CoreResult<ProcessOutput> {
    let ProcessRequest {
        task,
        command: spec,
        timeout,
    } = request;

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }
    #[cfg(unix)]
    command.process_group(0);

    let started = Instant::now();
    let child = command.spawn().map_err(|error| {
        process_failure(
            &task,
            format!("failed to start '{}': {error}", spec.program.display()),
        )
    })?;
    let pid = child.id();
    tracing::debug!(task = %task, program = %spec.program.display(), pid, "started process");

    let collected = child.wait_with_output();
    let output = match timeout {
        None => collected.await,
        Some(limit) => match tokio::time::timeout(limit, collected).await {
            Ok(output) => output,
            Err(_) => {
                kill_group(pid);
                return Err(CoreError::new(
                    CoreErrorKind::Timeout,
                    format!("process timed out after {}ms", limit.as_millis()),
                )
                .for_task(task));
            }
        },
    }
    .map_err(|error| process_failure(&task, format!("failed to wait for process: {error}")))?;

    let exit = match output.status.code() {
        Some(code) => ProcessExit::Code(code),
        None => ProcessExit::Signal,
    };

    Ok(ProcessOutput {
        exit,
        stdout: output.stdout,
        stderr: output.stderr,
        elapsed: started.elapsed(),
    })
}

// Dropping the timed-out future kills the direct child; this reaches its
// descendants too.
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    let Some(group) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: kill has no memory-safety preconditions. The group was created
    // for this child and a stale group only yields ESRCH.
    unsafe {
        libc::kill(-group, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

fn process_failure(task: &str, message: String) -> CoreError {
    CoreError::new(CoreErrorKind::ProcessFailure, message).for_task(task)
}
