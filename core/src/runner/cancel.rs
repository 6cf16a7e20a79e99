use tokio::process::Child;

use crate::error::RunnerError;

/// Kills the direct child and its whole process group. Both mechanisms are
/// always attempted; their failures are reported together.
pub(super) fn kill_process_group(child: &mut Child, pid: Option<u32>) -> Result<(), RunnerError> {
    let mut errors = Vec::new();

    if let Err(e) = child.start_kill() {
        errors.push(format!("kill child: {e}"));
    }

    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = pid {
            #[allow(clippy::cast_possible_wrap)]
            let pgid = Pid::from_raw(pid as i32);
            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                errors.push(format!("kill process group: {e}"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RunnerError::Cancel {
            pid: pid.unwrap_or_default(),
            errors,
        })
    }
}
