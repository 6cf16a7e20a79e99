use std::ffi::OsString;
use std::path::PathBuf;

use crate::upload::UploadReport;

/// Wrap mode: run the build, then ship what it produced.
#[derive(Debug, Clone, Default)]
pub struct WrapArgs {
    /// Forwarded to the build tool unmodified.
    pub args: Vec<OsString>,
    pub silent: bool,
}

/// Upload-only mode: ship artifacts a previous build left behind.
#[derive(Debug, Clone, Default)]
pub struct UploadOnlyArgs {
    /// Takes precedence over the configured token.
    pub token: Option<String>,
    /// Build log shipped in place of captured stdout.
    pub log_file: Option<PathBuf>,
    /// Arguments recorded with the upload.
    pub args: Vec<String>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub exit_code: i32,
    /// `None` when the upload phase never started.
    pub upload: Option<UploadReport>,
}
