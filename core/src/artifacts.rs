//! Harvesting of the JSON artifacts dbt leaves in its target directory.

use std::path::Path;

use serde::Deserialize;

use crate::types::{ArtifactBundle, ArtifactKind};

#[derive(Deserialize, Default)]
struct ArtifactProbe {
    #[serde(default)]
    metadata: ProbeMetadata,
}

#[derive(Deserialize, Default)]
struct ProbeMetadata {
    #[serde(default)]
    invocation_id: Option<String>,
}

/// Extracts `metadata.invocation_id` without validating the rest of the
/// document. Anything unparsable yields an empty id.
pub fn invocation_id(content: &str) -> String {
    serde_json::from_str::<ArtifactProbe>(content)
        .ok()
        .and_then(|probe| probe.metadata.invocation_id)
        .unwrap_or_default()
}

/// Reads every known artifact under `target_dir` into a fresh bundle.
///
/// Missing or unreadable files are logged and left out; the result is never
/// an error, even when nothing was found.
pub fn collect_artifacts(target_dir: &Path) -> ArtifactBundle {
    let mut bundle = ArtifactBundle::default();

    for kind in ArtifactKind::ALL {
        let path = target_dir.join(kind.file_name());
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::info!(path = %path.display(), error = %e, "artifact not collected");
                continue;
            }
        };

        let id = invocation_id(&content);
        tracing::info!(artifact = %kind, invocation_id = %id, "artifact found");

        if bundle.invocation_id.is_empty() {
            bundle.invocation_id = id;
        }
        bundle.set_artifact(kind, content);
    }

    if bundle.is_empty() {
        tracing::warn!(dir = %target_dir.display(), "no dbt artifacts found");
    }

    bundle
}
