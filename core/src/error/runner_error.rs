// core/src/error/runner_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn process: {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for process: {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error while streaming: {stream}")]
    StreamIo {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("process killed by signal: {signal}")]
    Signal { signal: i32 },

    #[error("error cancelling pid={pid}, errors={errors:?}")]
    Cancel { pid: u32, errors: Vec<String> },
}
