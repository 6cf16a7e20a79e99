use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "synq-dbt.toml";

/// Loads `synq-dbt.toml` (or the file named by `SYNQ_CONFIG`) and applies
/// the `SYNQ_*` environment overrides on top.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let lookup = |key: &str| std::env::var(key).ok();
    let path = lookup("SYNQ_CONFIG")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    load_from(&path, lookup)
}

pub fn load_from<F>(path: &Path, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg: AppConfig = if path.exists() {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, lookup);
    validate(&cfg)?;
    Ok(cfg)
}

pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("SYNQ_TOKEN") {
        cfg.token = Some(v.trim().to_string());
    }
    if let Some(v) = non_empty("SYNQ_TARGET_DIR") {
        cfg.target_dir = v;
    }
    if let Some(v) = non_empty("SYNQ_DBT_BIN") {
        cfg.dbt_bin = v;
    }
    if let Some(v) = non_empty("SYNQ_UPLOAD_URL") {
        cfg.legacy_endpoint = v;
    }
    if let Some(v) = non_empty("SYNQ_API_ENDPOINT") {
        cfg.api_endpoint = v;
    }
    if let Some(v) = non_empty("SYNQ_API_V2") {
        match parse_bool(&v) {
            Some(flag) => cfg.api_v2 = flag,
            None => tracing::warn!(value = %v, "ignoring unparsable SYNQ_API_V2"),
        }
    }
}

fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.dbt_bin.trim().is_empty() {
        return Err(ConfigError::Validation("dbt_bin must not be empty".into()));
    }
    if cfg.upload.attempt_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "upload.attempt_timeout_ms must be positive".into(),
        ));
    }
    Ok(())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(&dir.path().join("missing.toml"), env(&[])).unwrap();

        assert_eq!(cfg.token, None);
        assert_eq!(cfg.target_dir, "target");
        assert_eq!(cfg.dbt_bin, "dbt");
        assert_eq!(cfg.legacy_endpoint, "dbtapi.synq.io:443");
        assert_eq!(cfg.api_endpoint, "https://developer.synq.io/");
        assert!(!cfg.api_v2);
        assert_eq!(cfg.upload.max_retries, 3);
        assert_eq!(cfg.upload.retry_delays_ms, vec![5_000, 10_000, 15_000]);
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synq-dbt.toml");
        std::fs::write(
            &path,
            r#"
target_dir = "build"
api_v2 = true

[upload]
max_retries = 1
retry_delays_ms = [100]
"#,
        )
        .unwrap();

        let cfg = load_from(
            &path,
            env(&[
                ("SYNQ_TOKEN", " st-abc \n"),
                ("SYNQ_TARGET_DIR", "out"),
                ("SYNQ_UPLOAD_URL", "localhost:9000"),
                ("SYNQ_API_V2", "false"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.token.as_deref(), Some("st-abc"));
        assert_eq!(cfg.target_dir, "out");
        assert_eq!(cfg.legacy_endpoint, "localhost:9000");
        assert!(!cfg.api_v2);
        assert_eq!(cfg.upload.max_retries, 1);
        assert_eq!(cfg.upload.attempt_timeout_ms, 30_000);
    }

    #[test]
    fn blank_and_invalid_env_values_are_ignored() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[("SYNQ_TOKEN", "  "), ("SYNQ_API_V2", "maybe")]),
        );
        assert_eq!(cfg.token, None);
        assert!(!cfg.api_v2);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synq-dbt.toml");
        std::fs::write(&path, "upload = 12").unwrap();

        let err = load_from(&path, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_capture_filters_prefixes_and_secrets() {
        let capture = crate::config::EnvCaptureConfig::default();
        assert!(capture.accepts("DBT_PROFILES_DIR"));
        assert!(capture.accepts("GITHUB_RUN_ID"));
        assert!(!capture.accepts("DBT_ENV_SECRET_PASSWORD"));
        assert!(!capture.accepts("SYNQ_TOKEN"));
        assert!(!capture.accepts("HOME"));
    }
}
