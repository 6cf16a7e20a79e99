//! ServicesFactory implementation: builds the upload and git services from config for the CLI.
use synq_dbt_core::api::{AppConfig, Services, ServicesFactory};

use crate::factory;

pub struct PluginServicesFactory;

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self
    }
}

impl ServicesFactory for PluginServicesFactory {
    fn build_services(&self, cfg: &AppConfig) -> Services {
        Services {
            uploader_factory: factory::build_uploader_factory(cfg),
            git: factory::build_git_context(cfg),
        }
    }
}
