pub mod exit;
mod cancel;
mod run;
mod spawn;
mod tee;
pub mod types;

pub use run::run_child_process;
pub use types::{ExecutionResult, RunnerStartArgs};
