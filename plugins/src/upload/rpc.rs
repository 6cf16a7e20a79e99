//! JSON unary RPC transport shared by both upload clients.

use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, HOST};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use synq_dbt_core::api::{UploadAck, UploadError};

const BODY_SNIPPET_CHARS: usize = 256;

/// Where one RPC surface lives: `scheme://host:port` plus the authority to
/// present in the `host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub base: String,
    pub authority: String,
}

impl RpcEndpoint {
    /// Parses a URL endpoint. The port falls back to the scheme default.
    pub fn from_url(endpoint: &str) -> Result<Self, UploadError> {
        let invalid = |reason: &str| UploadError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(endpoint.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;

        let authority = match url.port() {
            Some(p) => format!("{host}:{p}"),
            None => host.to_string(),
        };
        Ok(Self {
            base: format!("{}://{host}:{port}", url.scheme()),
            authority,
        })
    }

    /// Parses a `host:port` endpoint; a scheme is optional and defaults to https.
    pub fn from_host_port(endpoint: &str) -> Result<Self, UploadError> {
        let trimmed = endpoint.trim();
        if trimmed.contains("://") {
            Self::from_url(trimmed)
        } else {
            Self::from_url(&format!("https://{trimmed}"))
        }
    }

    pub fn method_url(&self, method_path: &str) -> String {
        format!("{}/{}", self.base, method_path.trim_start_matches('/'))
    }
}

pub(crate) struct RpcClient {
    http: Client,
    endpoint: RpcEndpoint,
    timeout: Duration,
}

impl RpcClient {
    pub(crate) fn new(endpoint: RpcEndpoint, timeout: Duration) -> Result<Self, UploadError> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint,
            timeout,
        })
    }

    pub(crate) fn endpoint(&self) -> &RpcEndpoint {
        &self.endpoint
    }

    pub(crate) async fn call<B: Serialize + ?Sized>(
        &self,
        method_path: &str,
        body: &B,
        bearer: Option<&str>,
        send_host: bool,
    ) -> Result<UploadAck, UploadError> {
        let mut req = self
            .http
            .post(self.endpoint.method_url(method_path))
            .header(CONTENT_TYPE, "application/json")
            .header("connect-protocol-version", "1")
            .json(body);

        if let Some(token) = bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if send_host {
            let host = HeaderValue::from_str(&self.endpoint.authority).map_err(|e| {
                UploadError::InvalidEndpoint {
                    endpoint: self.endpoint.authority.clone(),
                    reason: e.to_string(),
                }
            })?;
            req = req.header(HOST, host);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;

        check_status(status, &text)?;
        Ok(UploadAck { detail: text })
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, UploadError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("synq-dbt/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| UploadError::Transport(anyhow::anyhow!("failed to build HTTP client: {e}")))
}

pub(crate) fn map_transport(e: reqwest::Error, timeout: Duration) -> UploadError {
    if e.is_timeout() {
        UploadError::Timeout { after: timeout }
    } else {
        UploadError::Transport(e.into())
    }
}

pub(crate) fn check_status(status: StatusCode, body: &str) -> Result<(), UploadError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(UploadError::Unauthorized);
    }
    if !status.is_success() {
        return Err(UploadError::HttpStatus {
            status: status.as_u16(),
            body_snippet: snippet(body),
        });
    }
    Ok(())
}

pub(crate) fn snippet(body: &str) -> String {
    let mut out: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
    if body.chars().count() > BODY_SNIPPET_CHARS {
        out.push_str("...");
    }
    out
}
