use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use synq_dbt_core::api::{UploadCredential, UploadError};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::upload::rpc::{check_status, http_client, map_transport};

/// A cached token is replaced this long before it expires.
pub const TOKEN_REFRESH_LEEWAY: Duration = Duration::from_secs(10);

const TOKEN_PATH: &str = "/oauth2/token";
const TOKEN_USERNAME: &str = "synq";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    /// `None` means the server gave no lifetime; the token never expires.
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at
            .map_or(true, |at| now + TOKEN_REFRESH_LEEWAY < at)
    }
}

/// The API endpoint with its path replaced by the token path.
pub fn token_url(api_endpoint: &str) -> Result<Url, UploadError> {
    let mut url = Url::parse(api_endpoint.trim()).map_err(|e| UploadError::InvalidEndpoint {
        endpoint: api_endpoint.to_string(),
        reason: e.to_string(),
    })?;
    url.set_path(TOKEN_PATH);
    Ok(url)
}

/// Trades the long-lived credential for short-lived bearer tokens
/// (password grant) and hands out the cached one while it is fresh.
pub struct LongLivedTokenSource {
    http: Client,
    token_url: Url,
    credential: UploadCredential,
    timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl LongLivedTokenSource {
    pub fn new(
        api_endpoint: &str,
        credential: UploadCredential,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        Ok(Self {
            http: http_client(timeout)?,
            token_url: token_url(api_endpoint)?,
            credential,
            timeout,
            cached: Mutex::new(None),
        })
    }

    /// A valid access token, exchanging the credential when none is cached
    /// or the cached one is about to expire.
    pub async fn bearer(&self) -> Result<String, UploadError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.access_token.clone());
        }

        let token = self.obtain().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn obtain(&self) -> Result<CachedToken, UploadError> {
        let form = [
            ("grant_type", "password"),
            ("username", TOKEN_USERNAME),
            ("password", self.credential.expose()),
        ];

        let requested_at = Instant::now();
        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;

        check_status(status, &text).map_err(|e| match e {
            UploadError::Unauthorized => UploadError::Auth("credential rejected".into()),
            other => UploadError::Auth(other.to_string()),
        })?;

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| UploadError::Decode(anyhow::anyhow!("token response: {e}")))?;
        if parsed.access_token.is_empty() {
            return Err(UploadError::Auth("empty access_token".into()));
        }

        tracing::debug!(
            token_type = parsed.token_type.as_deref().unwrap_or("bearer"),
            expires_in = ?parsed.expires_in,
            "obtained access token"
        );

        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: parsed
                .expires_in
                .map(|secs| requested_at + Duration::from_secs(secs)),
        })
    }
}
