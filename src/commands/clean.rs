//! Clean the artifact directory

use anyhow::Result;
use std::fs;

use crate::Site;

/// Remove every built artifact
pub fn run(site: &Site) -> Result<()> {
    if site.output_dir.exists() {
        fs::remove_dir_all(&site.output_dir)?;
        tracing::info!("Deleted: {:?}", site.output_dir);
    }

    Ok(())
}
