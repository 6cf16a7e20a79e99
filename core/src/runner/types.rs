use std::ffi::OsString;

use crate::error::RunnerError;

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    /// Passed to the child byte for byte, so non-UTF-8 arguments survive.
    pub args: Vec<OsString>,
    /// Keep the child's output off the parent's stdout/stderr (still captured).
    pub silent: bool,
}

impl RunnerStartArgs {
    pub fn new<I, S>(cmd: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            cmd: cmd.into(),
            args: args.into_iter().map(Into::into).collect(),
            silent: false,
        }
    }
}

/// Final state of the wrapped process. Built once, after the child exited
/// and both output pumps drained.
#[derive(Debug)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub error: Option<RunnerError>,
}

impl ExecutionResult {
    pub(crate) fn spawn_failed(error: RunnerError) -> Self {
        Self {
            exit_code: 1,
            stdout: Vec::new(),
            stderr: Vec::new(),
            error: Some(error),
        }
    }

    /// True when the child never started, so there is nothing to report on.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self.error, Some(RunnerError::Spawn { .. }))
    }
}
