use crate::error::RunnerError;

/// Maps an exit status to a shell-style exit code, together with the error
/// describing an abnormal termination.
pub fn normalize_exit(status: std::process::ExitStatus) -> (i32, Option<RunnerError>) {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            (code, None)
        } else if let Some(signal) = status.signal() {
            (128 + signal, Some(RunnerError::Signal { signal }))
        } else {
            (1, None)
        }
    }
    #[cfg(windows)]
    {
        (status.code().unwrap_or(1), None)
    }
}
