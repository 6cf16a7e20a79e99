// core/src/error/config_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not readable: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("config validation error: {0}")]
    Validation(String),
}
