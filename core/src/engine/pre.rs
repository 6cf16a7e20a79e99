use std::path::Path;

use crate::artifacts::collect_artifacts;
use crate::context::RunMetadata;
use crate::types::ArtifactBundle;

pub(crate) struct BundleInput<'a> {
    pub target_dir: &'a Path,
    pub meta: &'a RunMetadata,
    pub args: Vec<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
}

/// Collects the artifacts and stamps the run's facts onto the bundle.
pub(crate) fn build_bundle(input: BundleInput<'_>) -> ArtifactBundle {
    let BundleInput {
        target_dir,
        meta,
        args,
        stdout,
        stderr,
        exit_code,
    } = input;

    let mut bundle = collect_artifacts(target_dir);
    bundle.stdout = stdout;
    bundle.stderr = stderr;
    bundle.args = args;
    bundle.exit_code = exit_code;
    bundle.env_vars = meta.env_vars.clone();
    bundle.uploader_version = meta.uploader_version.clone();
    bundle.uploader_build_time = meta.uploader_build_time.clone();
    bundle
}
