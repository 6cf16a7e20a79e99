use std::process::Stdio;

use tokio::process::{Child, Command};

use super::types::RunnerStartArgs;
use crate::error::RunnerError;

/// Starts the wrapped command as the leader of a new process group so the
/// whole tree can be signalled at once. Working directory and environment
/// are inherited untouched.
pub(super) fn spawn(args: &RunnerStartArgs) -> Result<Child, RunnerError> {
    let mut cmd = Command::new(&args.cmd);
    cmd.args(&args.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn().map_err(|source| RunnerError::Spawn {
        program: args.cmd.clone(),
        source,
    })
}
