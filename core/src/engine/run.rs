use std::path::Path;

use tokio::sync::oneshot;

use crate::context::AppContext;
use crate::runner::{run_child_process, RunnerStartArgs};

use super::post::{post_run, resolve_credential};
use super::pre::{build_bundle, BundleInput};
use super::types::{RunSummary, UploadOnlyArgs, WrapArgs};

/// Runs the build tool, collects and uploads its artifacts, and reports the
/// build's own exit code. Upload problems never change that code.
pub async fn run_wrapped(
    ctx: &AppContext,
    args: WrapArgs,
    cancel: oneshot::Receiver<()>,
) -> RunSummary {
    let cfg = ctx.cfg();
    let start_args = RunnerStartArgs {
        cmd: cfg.dbt_bin.clone(),
        args: args.args,
        silent: args.silent,
    };

    let result = run_child_process(&start_args, cancel).await;

    if result.is_spawn_failure() {
        return RunSummary {
            exit_code: result.exit_code,
            upload: None,
        };
    }
    if let Some(err) = &result.error {
        tracing::warn!(error = %err, "subcommand ended abnormally");
    }

    let exit_code = result.exit_code;
    let bundle = build_bundle(BundleInput {
        target_dir: Path::new(&cfg.target_dir),
        meta: ctx.meta(),
        args: start_args
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect(),
        stdout: result.stdout,
        stderr: result.stderr,
        exit_code: Some(exit_code),
    });

    let credential = resolve_credential(ctx, None);
    let report = post_run(ctx, bundle, credential.as_ref()).await;

    RunSummary {
        exit_code,
        upload: Some(report),
    }
}

/// Ships artifacts from an earlier build. Always reports exit code 0.
pub async fn run_upload_only(ctx: &AppContext, args: UploadOnlyArgs) -> RunSummary {
    let UploadOnlyArgs {
        token,
        log_file,
        args,
    } = args;

    let stdout = match &log_file {
        Some(path) => match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read dbt log file");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let bundle = build_bundle(BundleInput {
        target_dir: Path::new(&ctx.cfg().target_dir),
        meta: ctx.meta(),
        args,
        stdout,
        stderr: Vec::new(),
        exit_code: None,
    });

    let credential = resolve_credential(ctx, token.as_deref());
    let report = post_run(ctx, bundle, credential.as_ref()).await;

    RunSummary {
        exit_code: 0,
        upload: Some(report),
    }
}
