mod config_error;
mod runner_error;
mod upload_error;

pub use config_error::ConfigError;
pub use runner_error::RunnerError;
pub use upload_error::UploadError;
