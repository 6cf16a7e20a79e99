use std::ffi::OsString;

use synq_dbt_core::api::{
    capture_env_vars, AppConfig, AppContext, RunMetadata, RunSummary, ServicesFactory,
    UploadOnlyArgs, UploadOutcome, WrapArgs,
};
use synq_dbt_core::config;
use synq_dbt_plugins::services::PluginServicesFactory;

use crate::commands::cli::{warns_missing_artifacts, Invocation, UploadArgs};
use crate::signals::spawn_shutdown_listener;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_TIME: &str = match option_env!("SYNQ_DBT_BUILD_TIME") {
    Some(t) => t,
    None => "unknown",
};

/// Runs one invocation and returns the process exit code.
pub async fn run_app(invocation: Invocation) -> i32 {
    log_startup();

    let cfg = load_config();
    let services = PluginServicesFactory.build_services(&cfg);
    let meta = RunMetadata {
        uploader_version: VERSION.to_string(),
        uploader_build_time: BUILD_TIME.to_string(),
        env_vars: capture_env_vars(std::env::vars_os(), &cfg.env_capture),
    };
    let ctx = AppContext::new(cfg, services, meta);

    let summary = match invocation {
        Invocation::Wrap(args) => run_wrap(&ctx, args).await,
        Invocation::Upload(args) => run_upload(&ctx, args).await,
    };
    summary.exit_code
}

async fn run_wrap(ctx: &AppContext, args: Vec<OsString>) -> RunSummary {
    if warns_missing_artifacts(&args) {
        tracing::warn!("--no-write-json is set, dbt will not write the artifacts synq-dbt uploads");
    }
    tracing::info!(target_dir = %ctx.cfg().target_dir, dbt = %ctx.cfg().dbt_bin, "running dbt");

    let cancel = spawn_shutdown_listener();
    let summary =
        synq_dbt_core::api::run_wrapped(ctx, WrapArgs { args, silent: false }, cancel).await;
    log_outcome(&summary);
    summary
}

async fn run_upload(ctx: &AppContext, args: UploadArgs) -> RunSummary {
    let summary = synq_dbt_core::api::run_upload_only(
        ctx,
        UploadOnlyArgs {
            token: args.synq_token,
            log_file: args.dbt_log_file,
            args: Vec::new(),
        },
    )
    .await;
    log_outcome(&summary);
    summary
}

fn log_outcome(summary: &RunSummary) {
    let Some(report) = &summary.upload else {
        return;
    };
    if let UploadOutcome::Failed { attempts, .. } = &report.outcome {
        tracing::warn!(
            attempts,
            exit_code = summary.exit_code,
            "artifacts were not uploaded, exiting with the dbt exit code"
        );
    }
}

/// A broken config file must not stop the build; fall back to defaults and
/// environment overrides.
fn load_config() -> AppConfig {
    match config::load_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid synq-dbt configuration, using defaults");
            let mut cfg = AppConfig::default();
            config::apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
            cfg
        }
    }
}

#[cfg(unix)]
fn log_startup() {
    use nix::unistd::{getpgrp, getpid, getppid};

    tracing::info!(
        "synq-dbt {VERSION} ({BUILD_TIME}) started (pid {} pgrp {} ppid {})",
        getpid(),
        getpgrp(),
        getppid()
    );
}

#[cfg(not(unix))]
fn log_startup() {
    tracing::info!(
        "synq-dbt {VERSION} ({BUILD_TIME}) started (pid {})",
        std::process::id()
    );
}
