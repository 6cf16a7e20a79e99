use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::Parser;

/// First argument that switches from wrap mode to upload-only mode.
pub const UPLOAD_COMMAND: &str = "synq_upload_artifacts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Everything after the program name, forwarded to dbt untouched.
    Wrap(Vec<OsString>),
    Upload(UploadArgs),
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = UPLOAD_COMMAND,
    version,
    about = "Sends the content of dbt artifacts from a previous run to SYNQ"
)]
pub struct UploadArgs {
    /// SYNQ API token, takes precedence over SYNQ_TOKEN.
    #[arg(long = "synq-token")]
    pub synq_token: Option<String>,

    /// File with the log output of the dbt command.
    #[arg(long = "dbt-log-file")]
    pub dbt_log_file: Option<PathBuf>,
}

/// Splits the process arguments into a mode. Only upload-only mode is parsed
/// with clap; wrap mode must not interpret any of dbt's flags.
pub fn parse_invocation<I, T>(argv: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let rest: Vec<OsString> = argv.into_iter().skip(1).map(Into::into).collect();
    match rest.first() {
        Some(first) if first.as_os_str() == OsStr::new(UPLOAD_COMMAND) => {
            UploadArgs::try_parse_from(rest).map(Invocation::Upload)
        }
        _ => Ok(Invocation::Wrap(rest)),
    }
}

pub fn warns_missing_artifacts(args: &[OsString]) -> bool {
    args.iter().any(|a| a.as_os_str() == OsStr::new("--no-write-json"))
}
