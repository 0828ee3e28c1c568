//! Artifact persistence

use std::path::{Path, PathBuf};

use super::error::DocumentError;
use crate::content::Post;

/// Location of the artifact for `slug`
pub fn artifact_path(artifact_dir: &Path, slug: &str) -> PathBuf {
    artifact_dir.join(format!("{}.json", slug))
}

/// Write `post` to `<artifact_dir>/<slug>.json`.
///
/// The JSON goes to a hidden temp file first and is renamed over the final
/// path, so readers never observe a half-written artifact.
pub async fn write_artifact(artifact_dir: &Path, post: &Post) -> Result<PathBuf, DocumentError> {
    let path = artifact_path(artifact_dir, &post.slug);
    let tmp = artifact_dir.join(format!(".{}.json.tmp", post.slug));
    let write_err = |source| DocumentError::Write {
        path: path.clone(),
        source,
    };

    let mut json = serde_json::to_string_pretty(post)?;
    json.push('\n');

    tokio::fs::create_dir_all(artifact_dir)
        .await
        .map_err(write_err)?;
    let persisted = match tokio::fs::write(&tmp, json).await {
        Ok(()) => tokio::fs::rename(&tmp, &path).await,
        Err(e) => Err(e),
    };
    if let Err(source) = persisted {
        // A failed write may still have left a partial temp file behind
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(source));
    }

    Ok(path)
}
