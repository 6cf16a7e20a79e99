use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::protocol::ProtocolGeneration;
use super::retry::{execute_with_retry, RetryOutcome, RetryPolicy};
use super::traits::{UploadAck, UploaderFactory};
use crate::error::UploadError;
use crate::git::GitContextProvider;
use crate::types::{ArtifactBundle, GitContext, UploadCredential};

#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded { attempts: u32, ack: UploadAck },
    /// All four artifact payloads were empty; nothing was sent.
    NothingToUpload,
    /// No credential configured; the upload phase was skipped.
    Skipped,
    Failed { attempts: u32, error: UploadError },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, UploadOutcome::Failed { .. })
    }
}

#[derive(Debug)]
pub struct UploadReport {
    pub generation: Option<ProtocolGeneration>,
    pub outcome: UploadOutcome,
}

/// Drives one bundle to the remote service: picks the protocol generation,
/// builds the matching client and retries it under the policy. Failures are
/// reported, never raised.
pub struct UploadDispatcher {
    policy: RetryPolicy,
    factory: Arc<dyn UploaderFactory>,
    force_modern: bool,
    git: Option<(Arc<dyn GitContextProvider>, PathBuf)>,
}

impl UploadDispatcher {
    pub fn new(policy: RetryPolicy, factory: Arc<dyn UploaderFactory>, force_modern: bool) -> Self {
        Self {
            policy,
            factory,
            force_modern,
            git: None,
        }
    }

    /// Enriches modern uploads with repository context read from `dir`.
    pub fn with_git_context(
        mut self,
        provider: Arc<dyn GitContextProvider>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.git = Some((provider, dir.into()));
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn dispatch(
        &self,
        mut bundle: ArtifactBundle,
        credential: Option<&UploadCredential>,
    ) -> UploadReport {
        if bundle.is_empty() {
            tracing::warn!("nothing to upload");
            return UploadReport {
                generation: None,
                outcome: UploadOutcome::NothingToUpload,
            };
        }

        let Some(credential) = credential else {
            tracing::warn!("missing SYNQ_TOKEN, skipping upload");
            return UploadReport {
                generation: None,
                outcome: UploadOutcome::Skipped,
            };
        };

        let generation = ProtocolGeneration::select(credential, self.force_modern);
        if generation == ProtocolGeneration::Modern && bundle.git.is_none() {
            bundle.git = self.collect_git().await;
        }
        let outcome = self.dispatch_with(generation, &bundle, credential).await;
        UploadReport {
            generation: Some(generation),
            outcome,
        }
    }

    async fn collect_git(&self) -> Option<GitContext> {
        let (provider, dir) = self.git.as_ref()?;
        let git = provider.collect(Path::new(dir)).await;
        match &git {
            Some(g) => tracing::debug!(
                provider = provider.name(),
                branch = %g.branch,
                commit = %g.commit_sha,
                "git context collected"
            ),
            None => tracing::debug!(provider = provider.name(), "no git context"),
        }
        git
    }

    async fn dispatch_with(
        &self,
        generation: ProtocolGeneration,
        bundle: &ArtifactBundle,
        credential: &UploadCredential,
    ) -> UploadOutcome {
        let uploader = match self.factory.build(generation, credential) {
            Ok(uploader) => uploader,
            Err(error) => {
                tracing::error!(%generation, error = %error, "could not create upload client");
                return UploadOutcome::Failed { attempts: 0, error };
            }
        };

        tracing::info!(
            %generation,
            client = uploader.name(),
            invocation_id = %bundle.invocation_id,
            "uploading artifacts"
        );

        match execute_with_retry(&self.policy, |_| uploader.upload(bundle)).await {
            RetryOutcome::Succeeded { value, attempts } => {
                tracing::info!(attempts, ack = %value.detail, "upload successfully finished");
                UploadOutcome::Uploaded {
                    attempts,
                    ack: value,
                }
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::error!(error = %last_error, "upload failed after {attempts} attempts");
                UploadOutcome::Failed {
                    attempts,
                    error: last_error,
                }
            }
        }
    }
}
