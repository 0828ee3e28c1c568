//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub url: String,

    // Directory
    /// Where built artifacts are written, one subdirectory per collection
    pub output_dir: String,
    /// Static files served as-is by `folio serve`
    pub static_dir: String,

    // Build
    /// Appended to resolved asset URLs as `?v=<version>` when set
    pub asset_version: Option<String>,
    /// Upper bound for rendering or probing a single document
    pub render_timeout_secs: u64,
    pub highlight: HighlightConfig,

    // Server
    pub server: ServerConfig,

    // Content
    pub collections: Vec<CollectionConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Folio".to_string(),
            author: String::new(),
            url: "http://localhost:8000".to_string(),

            output_dir: ".build".to_string(),
            static_dir: "static".to_string(),

            asset_version: None,
            render_timeout_secs: 30,
            highlight: HighlightConfig::default(),

            server: ServerConfig::default(),

            collections: vec![CollectionConfig::posts(), CollectionConfig::blogs()],
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Look up a collection by name
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }
}

/// How the display date of a collection is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `January 5, 2024`
    #[default]
    Long,
    /// `Jan 5, 2024`
    Short,
}

/// Fallback values for a document's cover image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverDefaults {
    pub image: String,
    pub alt: String,
}

impl Default for CoverDefaults {
    fn default() -> Self {
        Self {
            image: "cover.png".to_string(),
            alt: "Cover".to_string(),
        }
    }
}

/// One content collection (posts, blogs, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub name: String,
    /// Directory holding one subdirectory per document
    pub source_dir: String,
    /// URL prefix of every document, e.g. `/posts`
    pub href_prefix: String,
    /// File name expected inside each document directory
    pub content_file: String,
    pub date_style: DateStyle,
    pub require_cover: bool,
    pub cover_defaults: CoverDefaults,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self::posts()
    }
}

impl CollectionConfig {
    pub fn posts() -> Self {
        Self {
            name: "posts".to_string(),
            source_dir: "static/posts".to_string(),
            href_prefix: "/posts".to_string(),
            content_file: "index.md".to_string(),
            date_style: DateStyle::Long,
            require_cover: false,
            cover_defaults: CoverDefaults::default(),
        }
    }

    pub fn blogs() -> Self {
        Self {
            name: "blogs".to_string(),
            source_dir: "static/blogs".to_string(),
            href_prefix: "/blogs".to_string(),
            content_file: "index.md".to_string(),
            date_style: DateStyle::Short,
            require_cover: true,
            cover_defaults: CoverDefaults::default(),
        }
    }

    /// Public URL of a document in this collection
    pub fn href_for(&self, slug: &str) -> String {
        format!("{}/{}", self.href_prefix.trim_end_matches('/'), slug)
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// `folio serve` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 8000,
        }
    }
}
