use std::sync::Arc;
use std::time::Duration;

use synq_dbt_core::api::{
    AppConfig, ArtifactUploader, GitContextProvider, NoopGitContext, ProtocolGeneration,
    UploadCredential, UploadError, UploaderFactory,
};

use crate::git::ShellGitContext;
use crate::upload::{LegacyUploader, ModernUploader};

/// Builds the reqwest-backed client for the selected generation.
pub struct PluginUploaderFactory {
    legacy_endpoint: String,
    api_endpoint: String,
    timeout: Duration,
}

impl PluginUploaderFactory {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            legacy_endpoint: cfg.legacy_endpoint.clone(),
            api_endpoint: cfg.api_endpoint.clone(),
            timeout: cfg.upload.attempt_timeout(),
        }
    }

    pub fn endpoint_for(&self, generation: ProtocolGeneration) -> &str {
        match generation {
            ProtocolGeneration::Legacy => &self.legacy_endpoint,
            ProtocolGeneration::Modern => &self.api_endpoint,
        }
    }
}

impl UploaderFactory for PluginUploaderFactory {
    fn build(
        &self,
        generation: ProtocolGeneration,
        credential: &UploadCredential,
    ) -> Result<Box<dyn ArtifactUploader>, UploadError> {
        let endpoint = self.endpoint_for(generation);
        tracing::info!(%generation, endpoint, "creating upload client");
        match generation {
            ProtocolGeneration::Legacy => Ok(Box::new(LegacyUploader::new(
                endpoint,
                credential.clone(),
                self.timeout,
            )?)),
            ProtocolGeneration::Modern => Ok(Box::new(ModernUploader::new(
                endpoint,
                credential.clone(),
                self.timeout,
            )?)),
        }
    }
}

pub fn build_uploader_factory(cfg: &AppConfig) -> Arc<dyn UploaderFactory> {
    Arc::new(PluginUploaderFactory::new(cfg))
}

pub fn build_git_context(cfg: &AppConfig) -> Arc<dyn GitContextProvider> {
    if !cfg.git.enabled {
        return Arc::new(NoopGitContext);
    }
    Arc::new(ShellGitContext::new(Duration::from_millis(
        cfg.git.query_timeout_ms,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_generation_gets_its_endpoint() {
        let cfg = AppConfig::default();
        let factory = PluginUploaderFactory::new(&cfg);
        assert_eq!(
            factory.endpoint_for(ProtocolGeneration::Legacy),
            "dbtapi.synq.io:443"
        );
        assert_eq!(
            factory.endpoint_for(ProtocolGeneration::Modern),
            "https://developer.synq.io/"
        );
    }

    #[test]
    fn invalid_modern_endpoint_fails_the_build() {
        let cfg = AppConfig {
            api_endpoint: "developer.synq.io".into(),
            ..AppConfig::default()
        };
        let factory = PluginUploaderFactory::new(&cfg);
        let cred = UploadCredential::new("st-abc").unwrap();
        assert!(matches!(
            factory.build(ProtocolGeneration::Modern, &cred),
            Err(UploadError::InvalidEndpoint { .. })
        ));
        assert!(factory.build(ProtocolGeneration::Legacy, &cred).is_ok());
    }

    #[test]
    fn disabled_git_uses_noop() {
        let mut cfg = AppConfig::default();
        cfg.git.enabled = false;
        assert_eq!(build_git_context(&cfg).name(), "noop");
    }
}
