// core/src/error/upload_error.rs
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("token exchange failed: {0}")]
    Auth(String),

    #[error("unauthorized (check SYNQ_TOKEN)")]
    Unauthorized,

    #[error("unexpected status: {status} {body_snippet}")]
    HttpStatus { status: u16, body_snippet: String },

    #[error("transport error: {0:#}")]
    Transport(#[source] anyhow::Error),

    #[error("decode/serde error: {0:#}")]
    Decode(#[source] anyhow::Error),
}

impl UploadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, UploadError::Timeout { .. })
    }
}
