//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `synq_dbt_core::api` instead of reaching into internal modules.

pub use crate::artifacts::collect_artifacts;
pub use crate::config::{AppConfig, EnvCaptureConfig, GitConfig, UploadConfig};
pub use crate::context::{capture_env_vars, AppContext, RunMetadata, Services, ServicesFactory};
pub use crate::engine::{run_upload_only, run_wrapped, RunSummary, UploadOnlyArgs, WrapArgs};
pub use crate::error::{ConfigError, RunnerError, UploadError};
pub use crate::git::{GitContextProvider, NoopGitContext};
pub use crate::runner::{run_child_process, ExecutionResult, RunnerStartArgs};
pub use crate::types::{ArtifactBundle, ArtifactKind, GitContext, UploadCredential};
pub use crate::upload::{
    ArtifactUploader, ProtocolGeneration, RetryPolicy, UploadAck, UploadDispatcher, UploadOutcome,
    UploadReport, UploaderFactory, MODERN_TOKEN_PREFIX,
};
