use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinError;
use tokio::time::Instant;

use super::cancel::kill_process_group;
use super::exit::normalize_exit;
use super::spawn::spawn;
use super::tee::{self, Pump, PumpOutput};
use super::types::{ExecutionResult, RunnerStartArgs};
use crate::error::RunnerError;

/// How long the pumps may keep reading after the child exited. A descendant
/// that inherited the pipes would otherwise keep the run alive forever.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Bound on a stopped pump handing back its buffer.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// Runs the wrapped command to completion, echoing and capturing its output.
///
/// Firing `cancel` kills the child's whole process group; the call then
/// returns as soon as the child is reaped.
pub async fn run_child_process(
    args: &RunnerStartArgs,
    mut cancel: oneshot::Receiver<()>,
) -> ExecutionResult {
    let mut child = match spawn(args) {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(cmd = %args.cmd, error = %e, "failed to start subcommand");
            return ExecutionResult::spawn_failed(e);
        }
    };

    let pid = child.id();
    tracing::info!(pid = ?pid, cmd = %args.cmd, "subcommand started");

    let out_task = child
        .stdout
        .take()
        .map(|s| tee::pump(s, tee::parent_stdout(args.silent), "stdout"));
    let err_task = child
        .stderr
        .take()
        .map(|s| tee::pump(s, tee::parent_stderr(args.silent), "stderr"));

    let mut cancel_error = None;
    let waited = tokio::select! {
        res = child.wait() => res,
        Ok(()) = &mut cancel => {
            tracing::info!(pid = ?pid, "cancelling subcommand");
            if let Err(e) = kill_process_group(&mut child, pid) {
                tracing::error!(error = %e, "subcommand cancellation incomplete");
                cancel_error = Some(e);
            }
            child.wait().await
        }
    };

    let (exit_code, exit_error) = match waited {
        Ok(status) => normalize_exit(status),
        Err(source) => (
            1,
            Some(RunnerError::Wait {
                program: args.cmd.clone(),
                source,
            }),
        ),
    };

    let deadline = Instant::now() + DRAIN_GRACE;
    let ((stdout, out_error), (stderr, err_error)) = tokio::join!(
        drain(out_task, "stdout", deadline),
        drain(err_task, "stderr", deadline)
    );

    tracing::info!(pid = ?pid, exit_code, "subcommand exited");

    ExecutionResult {
        exit_code,
        stdout,
        stderr,
        error: exit_error.or(cancel_error).or(out_error).or(err_error),
    }
}

async fn drain(task: Option<Pump>, stream: &'static str, deadline: Instant) -> PumpOutput {
    let Some(Pump { mut handle, stop }) = task else {
        return (Vec::new(), None);
    };
    if let Ok(joined) = tokio::time::timeout_at(deadline, &mut handle).await {
        return joined_output(joined, stream);
    }

    tracing::warn!(
        stream,
        grace = ?DRAIN_GRACE,
        "stream still open after subcommand exit, keeping output captured so far"
    );
    // Err means the pump finished on its own in the meantime.
    let _ = stop.send(());
    match tokio::time::timeout(STOP_GRACE, &mut handle).await {
        Ok(joined) => joined_output(joined, stream),
        Err(_) => {
            tracing::warn!(stream, "output pump did not stop, dropping captured output");
            handle.abort();
            (Vec::new(), None)
        }
    }
}

fn joined_output(joined: Result<PumpOutput, JoinError>, stream: &'static str) -> PumpOutput {
    match joined {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(stream, error = %e, "output pump failed");
            (Vec::new(), None)
        }
    }
}
