use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;

use crate::config::{AppConfig, EnvCaptureConfig};
use crate::git::GitContextProvider;
use crate::upload::{RetryPolicy, UploadDispatcher, UploaderFactory};

/// Pluggable collaborators the engine drives. Built once from config.
pub struct Services {
    pub uploader_factory: Arc<dyn UploaderFactory>,
    pub git: Arc<dyn GitContextProvider>,
}

pub trait ServicesFactory {
    fn build_services(&self, cfg: &AppConfig) -> Services;
}

/// Facts about this uploader and its environment, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct RunMetadata {
    pub uploader_version: String,
    pub uploader_build_time: String,
    pub env_vars: BTreeMap<String, String>,
}

/// Keeps the variables the capture config accepts. Later duplicates win.
/// Pairs that are not valid Unicode are skipped.
pub fn capture_env_vars<I>(vars: I, cfg: &EnvCaptureConfig) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
            (Ok(k), Ok(v)) => Some((k, v)),
            (k, _) => {
                tracing::debug!(key = ?k, "skipping non-unicode environment variable");
                None
            }
        })
        .filter(|(k, _)| cfg.accepts(k))
        .collect()
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services: Arc<Services>,
    meta: RunMetadata,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services: Services, meta: RunMetadata) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
            meta,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn meta(&self) -> &RunMetadata {
        &self.meta
    }

    /// Git context is attached only when enabled; the dispatcher decides
    /// whether a given upload needs it.
    pub fn dispatcher(&self) -> UploadDispatcher {
        let dispatcher = UploadDispatcher::new(
            RetryPolicy::from_config(&self.cfg.upload),
            self.services.uploader_factory.clone(),
            self.cfg.api_v2,
        );
        if self.cfg.git.enabled {
            dispatcher.with_git_context(self.services.git.clone(), ".")
        } else {
            dispatcher
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(OsString, OsString)> {
        pairs
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }

    #[test]
    fn capture_keeps_ci_context_and_drops_secrets() {
        let captured = capture_env_vars(
            vars(&[
                ("DBT_PROFILES_DIR", "/profiles"),
                ("GITHUB_RUN_ID", "42"),
                ("CI", "true"),
                ("SYNQ_TOKEN", "st-secret"),
                ("DBT_ENV_SECRET_PASSWORD", "hunter2"),
                ("HOME", "/root"),
                ("PATH", "/usr/bin"),
            ]),
            &EnvCaptureConfig::default(),
        );

        let keys: Vec<&str> = captured.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["CI", "DBT_PROFILES_DIR", "GITHUB_RUN_ID"]);
    }

    #[test]
    fn custom_prefixes_replace_defaults() {
        let cfg = EnvCaptureConfig {
            prefixes: vec!["MY_".into()],
            denylist: vec![],
        };
        let captured = capture_env_vars(vars(&[("MY_VAR", "1"), ("DBT_X", "2")]), &cfg);
        assert_eq!(captured.get("MY_VAR").map(String::as_str), Some("1"));
        assert!(!captured.contains_key("DBT_X"));
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_pairs_are_skipped_not_fatal() {
        use std::os::unix::ffi::OsStringExt;

        let mut input = vars(&[("DBT_TARGET", "prod"), ("CI", "true")]);
        input.push((
            OsString::from("DBT_WEIRD"),
            OsString::from_vec(b"caf\xe9".to_vec()),
        ));
        input.push((
            OsString::from_vec(b"DBT_\xff".to_vec()),
            OsString::from("x"),
        ));

        let captured = capture_env_vars(input, &EnvCaptureConfig::default());

        let keys: Vec<&str> = captured.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["CI", "DBT_TARGET"]);
    }
}
