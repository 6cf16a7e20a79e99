use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use synq_dbt_core::api::{
    ArtifactBundle, ArtifactKind, ArtifactUploader, GitContext, UploadAck, UploadCredential,
    UploadError,
};

use super::rpc::{RpcClient, RpcEndpoint};
use crate::auth::LongLivedTokenSource;

pub const MODERN_METHOD: &str = "synq.ingest.dbt.v1.DbtService/IngestInvocation";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IngestInvocationRequest<'a> {
    pub args: &'a [String],
    pub exit_code: i32,
    pub std_out: String,
    pub std_err: String,
    pub environment_vars: &'a BTreeMap<String, String>,
    pub artifacts: Vec<DbtArtifact>,
    pub uploader_version: &'a str,
    pub uploader_build_time: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_context: Option<GitContextBody<'a>>,
}

/// One typed artifact; exactly one field is set, bytes as base64.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) enum DbtArtifact {
    ManifestJson(String),
    RunResultsJson(String),
    SourcesJson(String),
    CatalogJson(String),
}

impl DbtArtifact {
    fn new(kind: ArtifactKind, content: &str) -> Self {
        let encoded = STANDARD.encode(content.as_bytes());
        match kind {
            ArtifactKind::Manifest => DbtArtifact::ManifestJson(encoded),
            ArtifactKind::RunResults => DbtArtifact::RunResultsJson(encoded),
            ArtifactKind::Sources => DbtArtifact::SourcesJson(encoded),
            ArtifactKind::Catalog => DbtArtifact::CatalogJson(encoded),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GitContextBody<'a> {
    pub clone_url: &'a str,
    pub branch: &'a str,
    pub commit_sha: &'a str,
}

impl<'a> From<&'a GitContext> for GitContextBody<'a> {
    fn from(g: &'a GitContext) -> Self {
        Self {
            clone_url: &g.clone_url,
            branch: &g.branch,
            commit_sha: &g.commit_sha,
        }
    }
}

impl<'a> IngestInvocationRequest<'a> {
    pub(crate) fn from_bundle(bundle: &'a ArtifactBundle) -> Self {
        Self {
            args: &bundle.args,
            exit_code: bundle.exit_code.unwrap_or_default(),
            std_out: STANDARD.encode(&bundle.stdout),
            std_err: STANDARD.encode(&bundle.stderr),
            environment_vars: &bundle.env_vars,
            artifacts: bundle
                .non_empty_artifacts()
                .into_iter()
                .map(|(kind, content)| DbtArtifact::new(kind, content))
                .collect(),
            uploader_version: &bundle.uploader_version,
            uploader_build_time: &bundle.uploader_build_time,
            git_context: bundle.git.as_ref().map(GitContextBody::from),
        }
    }
}

/// Structured invocation record behind a bearer token obtained from the
/// long-lived credential.
pub struct ModernUploader {
    rpc: RpcClient,
    tokens: LongLivedTokenSource,
}

impl ModernUploader {
    pub fn new(
        api_endpoint: &str,
        credential: UploadCredential,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        Ok(Self {
            rpc: RpcClient::new(RpcEndpoint::from_url(api_endpoint)?, timeout)?,
            tokens: LongLivedTokenSource::new(api_endpoint, credential, timeout)?,
        })
    }
}

#[async_trait]
impl ArtifactUploader for ModernUploader {
    fn name(&self) -> &str {
        &self.rpc.endpoint().base
    }

    async fn upload(&self, bundle: &ArtifactBundle) -> Result<UploadAck, UploadError> {
        let bearer = self.tokens.bearer().await?;
        let body = IngestInvocationRequest::from_bundle(bundle);
        let ack = self.rpc.call(MODERN_METHOD, &body, Some(bearer.as_str()), true).await?;
        tracing::info!(ack = %ack.detail, "metadata uploaded successfully (v2)");
        Ok(ack)
    }
}
