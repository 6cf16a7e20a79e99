mod post;
mod pre;
mod run;
mod types;

pub use run::{run_upload_only, run_wrapped};
pub use types::{RunSummary, UploadOnlyArgs, WrapArgs};
