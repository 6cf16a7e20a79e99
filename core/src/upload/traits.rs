use async_trait::async_trait;

use super::protocol::ProtocolGeneration;
use crate::error::UploadError;
use crate::types::{ArtifactBundle, UploadCredential};

/// What the server answered for an accepted upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadAck {
    pub detail: String,
}

/// One protocol generation's client. A call either returns the server's
/// acknowledgment or the reason the attempt failed.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    fn name(&self) -> &str;

    async fn upload(&self, bundle: &ArtifactBundle) -> Result<UploadAck, UploadError>;
}

pub trait UploaderFactory: Send + Sync {
    fn build(
        &self,
        generation: ProtocolGeneration,
        credential: &UploadCredential,
    ) -> Result<Box<dyn ArtifactUploader>, UploadError>;
}
