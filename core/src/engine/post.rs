use crate::context::AppContext;
use crate::types::{ArtifactBundle, UploadCredential};
use crate::upload::UploadReport;

/// Hands the bundle to the dispatcher. Never fails; the report says what
/// happened.
pub(crate) async fn post_run(
    ctx: &AppContext,
    bundle: ArtifactBundle,
    credential: Option<&UploadCredential>,
) -> UploadReport {
    ctx.dispatcher().dispatch(bundle, credential).await
}

pub(crate) fn resolve_credential(
    ctx: &AppContext,
    override_token: Option<&str>,
) -> Option<UploadCredential> {
    override_token
        .and_then(UploadCredential::new)
        .or_else(|| ctx.cfg().token.as_deref().and_then(UploadCredential::new))
}
