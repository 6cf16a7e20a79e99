mod legacy;
mod modern;
pub mod rpc;

pub use legacy::{LegacyUploader, LEGACY_METHOD};
pub use modern::{ModernUploader, MODERN_METHOD};
pub use rpc::RpcEndpoint;
