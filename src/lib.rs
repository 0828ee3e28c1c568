//! folio: content pipeline for a personal blog and portfolio
//!
//! Markdown documents with YAML front matter are built into JSON artifacts
//! (rendered HTML, reading time, table of contents, cover size). At serve
//! time the artifacts are loaded into a [`index::PostIndex`] per collection.

pub mod build;
pub mod commands;
pub mod config;
pub mod content;
pub mod index;
pub mod server;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use config::CollectionConfig;

/// The main site handle
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Artifact output directory
    pub output_dir: PathBuf,
    /// Static file directory
    pub static_dir: PathBuf,
}

impl Site {
    /// Create a new site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)
                .with_context(|| format!("Failed to load {:?}", config_path))?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let output_dir = base_dir.join(&config.output_dir);
        let static_dir = base_dir.join(&config.static_dir);
        Self {
            config,
            base_dir,
            output_dir,
            static_dir,
        }
    }

    /// Look up a collection, failing with the list of known names
    pub fn collection(&self, name: &str) -> Result<&CollectionConfig> {
        self.config.collection(name).ok_or_else(|| {
            let known: Vec<_> = self.config.collections.iter().map(|c| &c.name).collect();
            anyhow::anyhow!("Unknown collection: {}. Available: {:?}", name, known)
        })
    }

    /// Directory holding the collection's source documents
    pub fn source_dir(&self, collection: &CollectionConfig) -> PathBuf {
        self.base_dir.join(&collection.source_dir)
    }

    /// Directory the collection's artifacts are written to
    pub fn artifact_dir(&self, collection: &CollectionConfig) -> PathBuf {
        self.output_dir.join(&collection.name)
    }

    /// Build every collection, or only `only` when given
    pub async fn build(&self, only: Option<&str>) -> Result<Vec<build::BuildReport>> {
        commands::build::run(self, only).await
    }

    /// Load the index of every collection
    pub fn load_indices(&self) -> Result<IndexMap<String, index::PostIndex>> {
        let mut indices = IndexMap::new();
        for collection in &self.config.collections {
            let index = index::PostIndex::load(self.artifact_dir(collection))
                .with_context(|| format!("Failed to load {}", collection.name))?;
            indices.insert(collection.name.clone(), index);
        }
        Ok(indices)
    }

    /// Remove all built artifacts
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
