use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Long-lived SYNQ token. Usually supplied through `SYNQ_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_target_dir")]
    pub target_dir: String,

    #[serde(default = "default_dbt_bin")]
    pub dbt_bin: String,

    /// `host:port` of the legacy ingestion endpoint.
    #[serde(default = "default_legacy_endpoint")]
    pub legacy_endpoint: String,

    /// Base URL of the v2 API (token exchange and invocation ingest).
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Force the v2 protocol regardless of the token shape.
    #[serde(default)]
    pub api_v2: bool,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub env_capture: EnvCaptureConfig,
}

fn default_target_dir() -> String {
    "target".to_string()
}

fn default_dbt_bin() -> String {
    "dbt".to_string()
}

fn default_legacy_endpoint() -> String {
    "dbtapi.synq.io:443".to_string()
}

fn default_api_endpoint() -> String {
    "https://developer.synq.io/".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: None,
            target_dir: default_target_dir(),
            dbt_bin: default_dbt_bin(),
            legacy_endpoint: default_legacy_endpoint(),
            api_endpoint: default_api_endpoint(),
            api_v2: false,
            upload: UploadConfig::default(),
            git: GitConfig::default(),
            env_capture: EnvCaptureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    #[serde(default = "default_retry_delays_ms")]
    pub retry_delays_ms: Vec<u64>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_attempt_timeout_ms() -> u64 {
    30_000
}

fn default_retry_delays_ms() -> Vec<u64> {
    vec![5_000, 10_000, 15_000]
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            retry_delays_ms: default_retry_delays_ms(),
        }
    }
}

impl UploadConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_git_enabled")]
    pub enabled: bool,

    #[serde(default = "default_git_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_git_enabled() -> bool {
    true
}

fn default_git_timeout_ms() -> u64 {
    10_000
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: default_git_enabled(),
            query_timeout_ms: default_git_timeout_ms(),
        }
    }
}

/// Which parent environment variables travel with the upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvCaptureConfig {
    #[serde(default = "default_env_prefixes")]
    pub prefixes: Vec<String>,

    /// Keys containing any of these (case-insensitive) are never captured.
    #[serde(default = "default_env_denylist")]
    pub denylist: Vec<String>,
}

fn default_env_prefixes() -> Vec<String> {
    [
        "DBT_",
        "SYNQ_",
        "CI",
        "GITHUB_",
        "GITLAB_",
        "BUILDKITE_",
        "CIRCLE_",
        "BITBUCKET_",
        "JENKINS_",
        "BUILD_",
        "AIRFLOW_CTX_",
        "DAGSTER_",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_env_denylist() -> Vec<String> {
    ["TOKEN", "SECRET", "PASSWORD", "PASSWD", "KEY", "CREDENTIAL"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for EnvCaptureConfig {
    fn default() -> Self {
        Self {
            prefixes: default_env_prefixes(),
            denylist: default_env_denylist(),
        }
    }
}

impl EnvCaptureConfig {
    pub fn accepts(&self, key: &str) -> bool {
        let upper = key.to_ascii_uppercase();
        self.prefixes.iter().any(|p| upper.starts_with(p.as_str()))
            && !self.denylist.iter().any(|d| upper.contains(d.as_str()))
    }
}
