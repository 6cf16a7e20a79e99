use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use synq_dbt_core::api::{ArtifactBundle, ArtifactUploader, UploadAck, UploadCredential, UploadError};

use super::rpc::{RpcClient, RpcEndpoint};

pub const LEGACY_METHOD: &str = "synq.dbt.v1.DbtService/PostDbtResult";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostDbtResultRequest<'a> {
    pub dbt_result: DbtResult<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DbtResult<'a> {
    pub token: &'a str,
    pub invocation_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_results: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<&'a str>,
    pub std_out: String,
    pub std_err: String,
    pub env_vars: &'a BTreeMap<String, String>,
    pub args: &'a [String],
    pub uploader_version: &'a str,
    pub uploader_build_time: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl<'a> PostDbtResultRequest<'a> {
    pub(crate) fn from_bundle(bundle: &'a ArtifactBundle, token: &'a str) -> Self {
        Self {
            dbt_result: DbtResult {
                token,
                invocation_id: &bundle.invocation_id,
                manifest: bundle.manifest.as_deref(),
                run_results: bundle.run_results.as_deref(),
                catalog: bundle.catalog.as_deref(),
                sources: bundle.sources.as_deref(),
                std_out: STANDARD.encode(&bundle.stdout),
                std_err: STANDARD.encode(&bundle.stderr),
                env_vars: &bundle.env_vars,
                args: &bundle.args,
                uploader_version: &bundle.uploader_version,
                uploader_build_time: &bundle.uploader_build_time,
                exit_code: bundle.exit_code,
            },
        }
    }
}

/// Flat bundle upload with the credential embedded in the request.
pub struct LegacyUploader {
    rpc: RpcClient,
    credential: UploadCredential,
}

impl LegacyUploader {
    pub fn new(
        endpoint: &str,
        credential: UploadCredential,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        Ok(Self {
            rpc: RpcClient::new(RpcEndpoint::from_host_port(endpoint)?, timeout)?,
            credential,
        })
    }
}

#[async_trait]
impl ArtifactUploader for LegacyUploader {
    fn name(&self) -> &str {
        &self.rpc.endpoint().base
    }

    async fn upload(&self, bundle: &ArtifactBundle) -> Result<UploadAck, UploadError> {
        if bundle.is_empty() {
            return Ok(UploadAck::default());
        }

        let body = PostDbtResultRequest::from_bundle(bundle, self.credential.expose());
        let ack = self.rpc.call(LEGACY_METHOD, &body, None, false).await?;
        tracing::info!(ack = %ack.detail, "synq-dbt upload successful (legacy)");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use synq_dbt_core::api::ArtifactKind;

    fn bundle() -> ArtifactBundle {
        let mut bundle = ArtifactBundle {
            invocation_id: "inv-1".into(),
            stdout: b"hello\n".to_vec(),
            args: vec!["run".into()],
            uploader_version: "1.6.0".into(),
            exit_code: Some(0),
            ..ArtifactBundle::default()
        };
        bundle.set_artifact(ArtifactKind::Manifest, r#"{"metadata":{}}"#.into());
        bundle
    }

    #[test]
    fn request_body_shape() {
        let b = bundle();
        let body = serde_json::to_value(PostDbtResultRequest::from_bundle(&b, "tok")).unwrap();
        let result = &body["dbtResult"];

        assert_eq!(result["token"], "tok");
        assert_eq!(result["invocationId"], "inv-1");
        assert_eq!(result["manifest"], r#"{"metadata":{}}"#);
        assert_eq!(result["stdOut"], "aGVsbG8K");
        assert_eq!(result["exitCode"], 0);
        assert!(result.get("catalog").is_none());
    }

    #[tokio::test]
    async fn posts_bundle_to_legacy_method() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/synq.dbt.v1.DbtService/PostDbtResult")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "dbtResult": { "token": "legacy-token", "invocationId": "inv-1" }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let uploader = LegacyUploader::new(
            &server.url(),
            UploadCredential::new("legacy-token").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        let ack = uploader.upload(&bundle()).await.unwrap();

        assert_eq!(ack.detail, "{}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/synq.dbt.v1.DbtService/PostDbtResult")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let uploader = LegacyUploader::new(
            &server.url(),
            UploadCredential::new("legacy-token").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();

        match uploader.upload(&bundle()).await {
            Err(UploadError::HttpStatus { status, body_snippet }) => {
                assert_eq!(status, 503);
                assert_eq!(body_snippet, "overloaded");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_bundle_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let uploader = LegacyUploader::new(
            &server.url(),
            UploadCredential::new("legacy-token").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        uploader.upload(&ArtifactBundle::default()).await.unwrap();
        mock.assert_async().await;
    }
}
