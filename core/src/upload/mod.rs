mod dispatcher;
mod protocol;
pub mod retry;
mod traits;

pub use dispatcher::{UploadDispatcher, UploadOutcome, UploadReport};
pub use protocol::{ProtocolGeneration, MODERN_TOKEN_PREFIX};
pub use retry::{execute_with_retry, RetryOutcome, RetryPolicy};
pub use traits::{ArtifactUploader, UploadAck, UploaderFactory};
