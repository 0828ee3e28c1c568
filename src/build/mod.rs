//! Build orchestrator - turns a content root into JSON artifacts
//!
//! Each immediate subdirectory of a collection's source directory is one
//! document. Documents are built one after another; a failing document is
//! recorded in the [`BuildReport`] and never stops its siblings.

mod artifact;
mod error;

pub use artifact::{artifact_path, write_artifact};
pub use error::{DocumentError, Stage};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

use crate::config::{CollectionConfig, SiteConfig};
use crate::content::metadata::{self, Dimensions};
use crate::content::{
    extract, resolve_assets, validate, AssetResolver, Cover, MarkdownRenderer, Post, Renderer,
    VersionedAssets,
};

/// Reads the pixel size of a cover image
pub trait ImageProber: Send + Sync {
    fn probe(&self, path: &Path) -> Option<Dimensions>;
}

/// Reads dimensions from the image file header
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderProber;

impl ImageProber for HeaderProber {
    fn probe(&self, path: &Path) -> Option<Dimensions> {
        metadata::probe_dimensions(path)
    }
}

/// A document directory found while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub slug: String,
    /// Directory holding the content file and its assets
    pub dir: PathBuf,
    /// The content file itself
    pub path: PathBuf,
}

/// Outcome of building one collection
#[derive(Debug, Default)]
pub struct BuildReport {
    pub collection: String,
    /// Slugs whose artifacts were written
    pub succeeded: Vec<String>,
    /// Slugs that failed, with the reason
    pub failed: Vec<(String, DocumentError)>,
    /// Artifacts removed because their source directory is gone
    pub pruned: Vec<String>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} built, {} failed, {} pruned",
            self.collection,
            self.succeeded.len(),
            self.failed.len(),
            self.pruned.len()
        )
    }
}

/// Runs the per-document pipeline and persists the results
pub struct Builder {
    renderer: Arc<dyn Renderer>,
    assets: Arc<dyn AssetResolver>,
    prober: Arc<dyn ImageProber>,
    timeout: Duration,
}

impl Builder {
    /// Create a builder from the site configuration
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            renderer: Arc::new(MarkdownRenderer::with_options(
                &config.highlight.theme,
                config.highlight.line_number,
            )),
            assets: Arc::new(VersionedAssets::new(config.asset_version.clone())),
            prober: Arc::new(HeaderProber),
            timeout: Duration::from_secs(config.render_timeout_secs.max(1)),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn ImageProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build every document of `collection` found under `source_dir`,
    /// writing artifacts to `artifact_dir`.
    ///
    /// Only a missing or unreadable source directory fails the whole build.
    pub async fn build(
        &self,
        collection: &CollectionConfig,
        source_dir: &Path,
        artifact_dir: &Path,
    ) -> Result<BuildReport> {
        let start = std::time::Instant::now();
        let documents = scan(source_dir, &collection.content_file)?;
        tracing::info!(
            "Found {} {} in {:?}",
            documents.len(),
            collection.name,
            source_dir
        );

        let mut report = BuildReport {
            collection: collection.name.clone(),
            ..Default::default()
        };

        for doc in &documents {
            let outcome = match self.build_document(collection, doc).await {
                Ok(post) => write_artifact(artifact_dir, &post).await.map(|_| post),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(post) => {
                    tracing::debug!("Built {} -> {}", doc.slug, post.href);
                    report.succeeded.push(doc.slug.clone());
                }
                Err(e) => {
                    tracing::warn!("Failed to build {:?}: {}", doc.path, e);
                    report.failed.push((doc.slug.clone(), e));
                }
            }
        }

        let live: HashSet<&str> = documents.iter().map(|d| d.slug.as_str()).collect();
        report.pruned = prune(artifact_dir, &live).await?;

        tracing::info!(
            "{} in {:.2}s",
            report.summary(),
            start.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    /// Extract, validate, render and derive metadata for one document
    pub async fn build_document(
        &self,
        collection: &CollectionConfig,
        doc: &SourceDocument,
    ) -> Result<Post, DocumentError> {
        let raw = tokio::fs::read_to_string(&doc.path)
            .await
            .map_err(|source| DocumentError::Read {
                path: doc.path.clone(),
                source,
            })?;

        let extracted = extract(&raw)?;
        let attrs = validate(&extracted.attributes, collection)?;

        let href = collection.href_for(&doc.slug);
        let markdown = resolve_assets(
            extracted.body,
            &format!("{}/", href),
            self.assets.as_ref(),
        )?;

        let html = self.render(markdown.clone()).await?;
        let headings = metadata::extract_headings(&html)?;
        let minutes_to_read = metadata::minutes_to_read(&markdown);
        let formatted_date = metadata::format_date(&attrs.date, collection.date_style);

        let dimensions = self.probe(doc.dir.join(&attrs.cover.image_name)).await?;
        let cover = Cover {
            resolved_image_path: self
                .assets
                .resolve(&format!("{}/{}", href, attrs.cover.image_name)),
            alt_text: attrs.cover.alt_text,
            caption: attrs.cover.caption,
            width: dimensions.map(|d| d.width),
            height: dimensions.map(|d| d.height),
        };

        Ok(Post {
            slug: doc.slug.clone(),
            href,
            title: attrs.title,
            description: attrs.description,
            date: attrs.date,
            formatted_date,
            tags: attrs.tags,
            minutes_to_read,
            cover,
            headings,
            markdown,
            html,
        })
    }

    async fn render(&self, markdown: String) -> Result<String, DocumentError> {
        let renderer = Arc::clone(&self.renderer);
        let task = tokio::task::spawn_blocking(move || renderer.render(&markdown));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(rendered)) => rendered.map_err(DocumentError::Render),
            Ok(Err(join_error)) => Err(DocumentError::Render(anyhow::anyhow!(
                "renderer stopped unexpectedly: {}",
                join_error
            ))),
            Err(_) => Err(DocumentError::Timeout {
                stage: Stage::Render,
                timeout: self.timeout,
            }),
        }
    }

    async fn probe(&self, path: PathBuf) -> Result<Option<Dimensions>, DocumentError> {
        let prober = Arc::clone(&self.prober);
        let task = tokio::task::spawn_blocking(move || prober.probe(&path));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(dimensions)) => Ok(dimensions),
            Ok(Err(join_error)) => {
                tracing::debug!("Image probe stopped unexpectedly: {}", join_error);
                Ok(None)
            }
            Err(_) => Err(DocumentError::Timeout {
                stage: Stage::ImageProbe,
                timeout: self.timeout,
            }),
        }
    }
}

/// List document directories under `source_dir` in name order.
///
/// Subdirectories without `content_file` are skipped.
pub fn scan(source_dir: &Path, content_file: &str) -> Result<Vec<SourceDocument>> {
    if !source_dir.is_dir() {
        anyhow::bail!("Content directory {:?} does not exist", source_dir);
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to scan {:?}", source_dir))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path().to_path_buf();
        let path = dir.join(content_file);
        if !path.is_file() {
            tracing::debug!("Skipping {:?}: no {}", dir, content_file);
            continue;
        }

        let Some(slug) = entry.file_name().to_str() else {
            tracing::warn!("Skipping {:?}: directory name is not valid UTF-8", dir);
            continue;
        };

        documents.push(SourceDocument {
            slug: slug.to_string(),
            dir,
            path,
        });
    }

    Ok(documents)
}

/// Remove artifacts whose slug is not in `live`
async fn prune(artifact_dir: &Path, live: &HashSet<&str>) -> Result<Vec<String>> {
    let mut pruned = Vec::new();
    if !artifact_dir.is_dir() {
        return Ok(pruned);
    }

    let mut entries = tokio::fs::read_dir(artifact_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|ext| ext != "json").unwrap_or(true) {
            continue;
        }
        let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !live.contains(slug) {
            tokio::fs::remove_file(&path).await?;
            tracing::info!("Deleted stale artifact: {:?}", path);
            pruned.push(slug.to_string());
        }
    }

    pruned.sort();
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ValidationError;
    use std::fs;

    fn write_doc(root: &Path, slug: &str, content: &str) {
        let dir = root.join(slug);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.md"), content).unwrap();
    }

    const VALID: &str = r#"---
title: First Post
date: 2024-01-15
description: The very first one
tags: [rust, web]
cover:
  alt: A sunrise
---

## Intro

Hello there. ![chart]({{asset: "chart.png"}})

## Details

More words.
"#;

    fn builder() -> Builder {
        Builder::new(&SiteConfig::default())
    }

    #[tokio::test]
    async fn test_build_writes_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        let out = tmp.path().join("out");
        write_doc(&source, "first-post", VALID);

        let report = builder()
            .build(&CollectionConfig::posts(), &source, &out)
            .await
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.succeeded, vec!["first-post"]);

        let json = fs::read_to_string(artifact_path(&out, "first-post")).unwrap();
        let post: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(post.href, "/posts/first-post");
        assert_eq!(post.formatted_date, "January 15, 2024");
        assert_eq!(post.tags, vec!["rust", "web"]);
        assert_eq!(post.minutes_to_read, 1);
        assert_eq!(post.cover.resolved_image_path, "/posts/first-post/cover.png");
        assert_eq!(post.cover.alt_text, "A sunrise");
        assert_eq!(post.cover.width, None);
        assert!(post.markdown.contains("(/posts/first-post/chart.png)"));
        assert!(post.html.contains(r#"src="/posts/first-post/chart.png""#));

        let toc: Vec<_> = post
            .headings
            .iter()
            .map(|h| (h.text.as_str(), h.level, h.href.as_str()))
            .collect();
        assert_eq!(toc, vec![("Intro", 2, "#intro"), ("Details", 2, "#details")]);
    }

    #[tokio::test]
    async fn test_failure_is_contained_to_document() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        let out = tmp.path().join("out");
        write_doc(&source, "a-good", VALID);
        write_doc(
            &source,
            "b-untitled",
            "---\ndate: 2024-01-15\ndescription: no title\n---\nBody",
        );
        write_doc(&source, "c-good", VALID);

        let report = builder()
            .build(&CollectionConfig::posts(), &source, &out)
            .await
            .unwrap();

        assert_eq!(report.succeeded, vec!["a-good", "c-good"]);
        assert_eq!(report.failed.len(), 1);
        let (slug, err) = &report.failed[0];
        assert_eq!(slug, "b-untitled");
        match err {
            DocumentError::Validation(v) => assert_eq!(v.field(), "title"),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(!artifact_path(&out, "b-untitled").exists());
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_directories_without_content_file_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        write_doc(&source, "real", VALID);
        fs::create_dir_all(source.join("images-only")).unwrap();
        fs::write(source.join("stray.md"), VALID).unwrap();

        let docs = scan(&source, "index.md").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].slug, "real");
        assert_eq!(docs[0].path, source.join("real").join("index.md"));
    }

    #[test]
    fn test_missing_source_dir_fails_build() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan(&tmp.path().join("nope"), "index.md").is_err());
    }

    #[tokio::test]
    async fn test_rebuild_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        let out = tmp.path().join("out");
        write_doc(&source, "same", VALID);

        let b = builder();
        b.build(&CollectionConfig::posts(), &source, &out)
            .await
            .unwrap();
        let first = fs::read(artifact_path(&out, "same")).unwrap();
        b.build(&CollectionConfig::posts(), &source, &out)
            .await
            .unwrap();
        let second = fs::read(artifact_path(&out, "same")).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_prune_removes_only_orphans() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        let out = tmp.path().join("out");
        write_doc(&source, "kept", VALID);
        write_doc(&source, "broken", VALID);
        write_doc(&source, "removed", VALID);

        let b = builder();
        b.build(&CollectionConfig::posts(), &source, &out)
            .await
            .unwrap();

        fs::remove_dir_all(source.join("removed")).unwrap();
        fs::write(source.join("broken").join("index.md"), "---\ntitle: [oops\n---\n").unwrap();

        let report = b
            .build(&CollectionConfig::posts(), &source, &out)
            .await
            .unwrap();
        assert_eq!(report.pruned, vec!["removed"]);
        assert!(!artifact_path(&out, "removed").exists());
        // The last good artifact of a failing document stays in place
        assert!(artifact_path(&out, "broken").exists());
        assert!(matches!(report.failed[0].1, DocumentError::Parse(_)));
    }

    struct SlowRenderer;

    impl Renderer for SlowRenderer {
        fn render(&self, _markdown: &str) -> anyhow::Result<String> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_render_timeout_fails_document() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        let out = tmp.path().join("out");
        write_doc(&source, "slow", VALID);

        let report = builder()
            .with_renderer(Arc::new(SlowRenderer))
            .with_timeout(Duration::from_millis(20))
            .build(&CollectionConfig::posts(), &source, &out)
            .await
            .unwrap();

        assert!(matches!(
            report.failed[0].1,
            DocumentError::Timeout {
                stage: Stage::Render,
                ..
            }
        ));
        assert!(!artifact_path(&out, "slow").exists());
    }

    struct AnchorlessRenderer;

    impl Renderer for AnchorlessRenderer {
        fn render(&self, _markdown: &str) -> anyhow::Result<String> {
            Ok("<h2>No anchor</h2>".to_string())
        }
    }

    #[tokio::test]
    async fn test_anchorless_renderer_is_inconsistent() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        write_doc(&source, "plain", VALID);

        let docs = scan(&source, "index.md").unwrap();
        let err = builder()
            .with_renderer(Arc::new(AnchorlessRenderer))
            .build_document(&CollectionConfig::posts(), &docs[0])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::RenderConsistency(_)));
    }

    struct FixedProber;

    impl ImageProber for FixedProber {
        fn probe(&self, path: &Path) -> Option<Dimensions> {
            path.ends_with("cover.png").then_some(Dimensions {
                width: 1200,
                height: 630,
            })
        }
    }

    #[tokio::test]
    async fn test_cover_dimensions_and_versioned_assets() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("posts");
        write_doc(&source, "sized", VALID);

        let config = SiteConfig {
            asset_version: Some("7".to_string()),
            ..Default::default()
        };
        let docs = scan(&source, "index.md").unwrap();
        let post = Builder::new(&config)
            .with_prober(Arc::new(FixedProber))
            .build_document(&CollectionConfig::posts(), &docs[0])
            .await
            .unwrap();

        assert_eq!(post.cover.width, Some(1200));
        assert_eq!(post.cover.height, Some(630));
        assert_eq!(post.cover.resolved_image_path, "/posts/sized/cover.png?v=7");
        assert!(post.markdown.contains("/posts/sized/chart.png?v=7"));
    }

    #[tokio::test]
    async fn test_validation_error_is_reported_before_rendering() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("blogs");
        write_doc(&source, "no-cover", VALID.replace("cover:\n  alt: A sunrise\n", "").as_str());

        let docs = scan(&source, "index.md").unwrap();
        let err = builder()
            .with_renderer(Arc::new(SlowRenderer))
            .build_document(&CollectionConfig::blogs(), &docs[0])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Validation(ValidationError::Missing { field: "cover", .. })
        ));
    }
}
