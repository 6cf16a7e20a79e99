use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The dbt artifacts the collector knows about, in correlation-id priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Manifest,
    RunResults,
    Catalog,
    Sources,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Manifest,
        ArtifactKind::RunResults,
        ArtifactKind::Catalog,
        ArtifactKind::Sources,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Manifest => "manifest.json",
            ArtifactKind::RunResults => "run_results.json",
            ArtifactKind::Catalog => "catalog.json",
            ArtifactKind::Sources => "sources.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitContext {
    pub clone_url: String,
    pub branch: String,
    pub commit_sha: String,
}

/// Everything shipped for one dbt invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub manifest: Option<String>,
    pub run_results: Option<String>,
    pub catalog: Option<String>,
    pub sources: Option<String>,
    pub invocation_id: String,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub env_vars: BTreeMap<String, String>,
    pub args: Vec<String>,
    pub uploader_version: String,
    pub uploader_build_time: String,
    /// `None` when no build was run (upload-only mode).
    pub exit_code: Option<i32>,
    pub git: Option<GitContext>,
}

impl ArtifactBundle {
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&str> {
        match kind {
            ArtifactKind::Manifest => self.manifest.as_deref(),
            ArtifactKind::RunResults => self.run_results.as_deref(),
            ArtifactKind::Catalog => self.catalog.as_deref(),
            ArtifactKind::Sources => self.sources.as_deref(),
        }
    }

    pub fn set_artifact(&mut self, kind: ArtifactKind, content: String) {
        let slot = match kind {
            ArtifactKind::Manifest => &mut self.manifest,
            ArtifactKind::RunResults => &mut self.run_results,
            ArtifactKind::Catalog => &mut self.catalog,
            ArtifactKind::Sources => &mut self.sources,
        };
        *slot = Some(content);
    }

    /// True when none of the four payloads carries any content.
    pub fn is_empty(&self) -> bool {
        ArtifactKind::ALL
            .iter()
            .all(|kind| self.artifact(*kind).map_or(true, str::is_empty))
    }

    /// Non-empty payloads in the order the structured invocation record lists them.
    pub fn non_empty_artifacts(&self) -> Vec<(ArtifactKind, &str)> {
        [
            ArtifactKind::Manifest,
            ArtifactKind::RunResults,
            ArtifactKind::Sources,
            ArtifactKind::Catalog,
        ]
        .into_iter()
        .filter_map(|kind| {
            self.artifact(kind)
                .filter(|content| !content.is_empty())
                .map(|content| (kind, content))
        })
        .collect()
    }
}

/// Long-lived upload token. The prefix decides the protocol generation.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadCredential(String);

impl UploadCredential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UploadCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(3).collect();
        write!(f, "UploadCredential({visible}***)")
    }
}
