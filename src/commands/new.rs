//! Create a new document

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Scaffold `<source_dir>/<slug>/<content_file>` for a new document
pub fn create_post(site: &Site, title: &str, collection: &str) -> Result<PathBuf> {
    let collection = site.collection(collection)?;
    let today = chrono::Local::now().date_naive();

    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a directory name from title {:?}", title);
    }

    let target_dir = site.source_dir(collection).join(&slug);
    let file_path = target_dir.join(&collection.content_file);

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    fs::create_dir_all(&target_dir)?;

    let cover = if collection.require_cover {
        format!("cover: {}\n", collection.cover_defaults.image)
    } else {
        String::new()
    };
    let content = format!(
        "---\ntitle: {}\ndate: {}\ndescription: \"\"\ntags: []\n{}---\n\n",
        serde_yaml::to_string(title)?.trim_end(),
        today.format("%Y-%m-%d"),
        cover
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
