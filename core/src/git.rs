use std::path::Path;

use async_trait::async_trait;

use crate::types::GitContext;

/// Best-effort repository introspection used to enrich uploads.
#[async_trait]
pub trait GitContextProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when no git tooling is available. Individual fields may be empty.
    async fn collect(&self, dir: &Path) -> Option<GitContext>;
}

/// Used when git enrichment is disabled or unavailable.
pub struct NoopGitContext;

#[async_trait]
impl GitContextProvider for NoopGitContext {
    fn name(&self) -> &str {
        "noop"
    }

    async fn collect(&self, _dir: &Path) -> Option<GitContext> {
        None
    }
}
