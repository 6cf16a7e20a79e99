//! Wrap and upload-only flows driven through stub upload services.
#![cfg(unix)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use synq_dbt_core::api::{
    run_upload_only, run_wrapped, AppConfig, AppContext, ArtifactBundle, ArtifactUploader,
    GitContext, GitContextProvider, ProtocolGeneration, RunMetadata, Services, UploadAck,
    UploadCredential, UploadError, UploadOnlyArgs, UploadOutcome, UploaderFactory, WrapArgs,
};
use tokio::sync::oneshot;

#[derive(Default)]
struct Recorded {
    generations: Mutex<Vec<ProtocolGeneration>>,
    bundles: Mutex<Vec<ArtifactBundle>>,
}

struct RecordingUploader(Arc<Recorded>);

#[async_trait]
impl ArtifactUploader for RecordingUploader {
    fn name(&self) -> &str {
        "recording"
    }

    async fn upload(&self, bundle: &ArtifactBundle) -> Result<UploadAck, UploadError> {
        self.0.bundles.lock().unwrap().push(bundle.clone());
        Ok(UploadAck::default())
    }
}

struct RecordingFactory(Arc<Recorded>);

impl UploaderFactory for RecordingFactory {
    fn build(
        &self,
        generation: ProtocolGeneration,
        _credential: &UploadCredential,
    ) -> Result<Box<dyn ArtifactUploader>, UploadError> {
        self.0.generations.lock().unwrap().push(generation);
        Ok(Box::new(RecordingUploader(self.0.clone())))
    }
}

struct FixedGit;

#[async_trait]
impl GitContextProvider for FixedGit {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn collect(&self, _dir: &Path) -> Option<GitContext> {
        Some(GitContext {
            clone_url: "git@example.com:org/repo.git".into(),
            branch: "main".into(),
            commit_sha: "abc123".into(),
        })
    }
}

fn context(target: &Path, dbt_bin: &str, token: Option<&str>) -> (AppContext, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let cfg = AppConfig {
        token: token.map(String::from),
        target_dir: target.display().to_string(),
        dbt_bin: dbt_bin.to_string(),
        ..AppConfig::default()
    };
    let services = Services {
        uploader_factory: Arc::new(RecordingFactory(recorded.clone())),
        git: Arc::new(FixedGit),
    };
    let meta = RunMetadata {
        uploader_version: "test".into(),
        uploader_build_time: "now".into(),
        env_vars: BTreeMap::new(),
    };
    (AppContext::new(cfg, services, meta), recorded)
}

fn write_manifest(dir: &Path) {
    std::fs::write(
        dir.join("manifest.json"),
        r#"{"metadata":{"invocation_id":"inv-42"}}"#,
    )
    .unwrap();
}

fn sh_args(script: &str) -> WrapArgs {
    WrapArgs {
        args: vec!["-c".into(), script.into()],
        silent: true,
    }
}

#[tokio::test]
async fn failing_build_still_uploads_and_mirrors_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    let (ctx, recorded) = context(dir.path(), "sh", Some("legacy-token"));
    let (_tx, rx) = oneshot::channel();

    let summary = run_wrapped(&ctx, sh_args("echo compiling; exit 3"), rx).await;

    assert_eq!(summary.exit_code, 3);
    let report = summary.upload.unwrap();
    assert!(matches!(report.outcome, UploadOutcome::Uploaded { attempts: 1, .. }));
    assert_eq!(report.generation, Some(ProtocolGeneration::Legacy));

    let bundles = recorded.bundles.lock().unwrap();
    assert_eq!(bundles.len(), 1);
    let bundle = &bundles[0];
    assert_eq!(bundle.exit_code, Some(3));
    assert_eq!(bundle.invocation_id, "inv-42");
    assert_eq!(bundle.stdout, b"compiling\n");
    assert_eq!(bundle.args, vec!["-c".to_string(), "echo compiling; exit 3".to_string()]);
    // Legacy uploads carry no git context, so none is collected.
    assert!(bundle.git.is_none());
}

#[tokio::test]
async fn spawn_failure_skips_upload() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    let (ctx, recorded) = context(dir.path(), "/nonexistent/dbt", Some("st-abc"));
    let (_tx, rx) = oneshot::channel();

    let summary = run_wrapped(&ctx, WrapArgs::default(), rx).await;

    assert_eq!(summary.exit_code, 1);
    assert!(summary.upload.is_none());
    assert!(recorded.generations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_token_skips_upload_but_keeps_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    let (ctx, recorded) = context(dir.path(), "sh", None);
    let (_tx, rx) = oneshot::channel();

    let summary = run_wrapped(&ctx, sh_args("exit 0"), rx).await;

    assert_eq!(summary.exit_code, 0);
    assert!(matches!(
        summary.upload.map(|r| r.outcome),
        Some(UploadOutcome::Skipped)
    ));
    assert!(recorded.bundles.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upload_only_uses_log_file_and_token_override() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    let log = dir.path().join("dbt.log");
    std::fs::write(&log, "12:00:00 Running with dbt=1.7.0\n").unwrap();
    let (ctx, recorded) = context(dir.path(), "dbt", None);

    let summary = run_upload_only(
        &ctx,
        UploadOnlyArgs {
            token: Some("st-override".into()),
            log_file: Some(log),
            args: vec![],
        },
    )
    .await;

    assert_eq!(summary.exit_code, 0);
    assert_eq!(
        *recorded.generations.lock().unwrap(),
        vec![ProtocolGeneration::Modern]
    );
    let bundles = recorded.bundles.lock().unwrap();
    assert_eq!(bundles[0].exit_code, None);
    assert_eq!(bundles[0].stdout, b"12:00:00 Running with dbt=1.7.0\n");
    assert_eq!(bundles[0].git.as_ref().map(|g| g.branch.as_str()), Some("main"));
}

#[tokio::test]
async fn non_utf8_arguments_are_recorded_lossily() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path());
    let (ctx, recorded) = context(dir.path(), "sh", Some("st-abc"));
    let (_tx, rx) = oneshot::channel();
    let args = WrapArgs {
        args: vec![
            OsString::from("-c"),
            OsString::from("exit 0"),
            OsString::from_vec(b"caf\xe9".to_vec()),
        ],
        silent: true,
    };

    let summary = run_wrapped(&ctx, args, rx).await;

    assert_eq!(summary.exit_code, 0);
    let bundles = recorded.bundles.lock().unwrap();
    assert_eq!(
        bundles[0].args,
        vec!["-c".to_string(), "exit 0".to_string(), "caf\u{FFFD}".to_string()]
    );
}

#[tokio::test]
async fn upload_only_with_empty_target_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, recorded) = context(dir.path(), "dbt", Some("abc"));

    let summary = run_upload_only(&ctx, UploadOnlyArgs::default()).await;

    assert_eq!(summary.exit_code, 0);
    assert!(matches!(
        summary.upload.map(|r| r.outcome),
        Some(UploadOutcome::NothingToUpload)
    ));
    assert!(recorded.generations.lock().unwrap().is_empty());
}
