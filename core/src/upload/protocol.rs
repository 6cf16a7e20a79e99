use std::fmt;

use crate::types::UploadCredential;

/// Tokens issued for the v2 API carry this prefix.
pub const MODERN_TOKEN_PREFIX: &str = "st-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolGeneration {
    /// Flat artifact bundle, credential embedded in the request.
    Legacy,
    /// Structured invocation record behind an OAuth bearer token.
    Modern,
}

impl ProtocolGeneration {
    pub fn select(credential: &UploadCredential, force_modern: bool) -> Self {
        if force_modern || credential.expose().starts_with(MODERN_TOKEN_PREFIX) {
            ProtocolGeneration::Modern
        } else {
            ProtocolGeneration::Legacy
        }
    }
}

impl fmt::Display for ProtocolGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolGeneration::Legacy => f.write_str("legacy"),
            ProtocolGeneration::Modern => f.write_str("v2"),
        }
    }
}
