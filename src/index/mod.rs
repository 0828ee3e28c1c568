//! Serve-time post index
//!
//! Built explicitly from an artifact directory at startup and then treated as
//! an immutable snapshot. [`PostIndex::reload`] swaps in a freshly loaded
//! snapshot only when the whole directory loads cleanly.

mod query;

pub use query::{sort_by_date, SortOrder, TagQuery};

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::content::Post;

/// Loading the artifact directory failed; no index was produced
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read artifacts from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt artifact {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Insertion-ordered slug → post mapping
#[derive(Debug, Clone, Default)]
pub struct PostIndex {
    dir: PathBuf,
    posts: IndexMap<String, Post>,
}

impl PostIndex {
    /// Read every `*.json` artifact in `dir`, in file name order.
    ///
    /// A missing directory yields an empty index.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, LoadError> {
        let dir = dir.as_ref().to_path_buf();
        let mut posts = IndexMap::new();

        if !dir.is_dir() {
            tracing::warn!("Artifact directory {:?} does not exist, index is empty", dir);
            return Ok(Self { dir, posts });
        }

        let io_err = |source| LoadError::Io {
            path: dir.clone(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let post = read_artifact(&path)?;
            posts.insert(post.slug.clone(), post);
        }

        tracing::info!("Loaded {} posts from {:?}", posts.len(), dir);
        Ok(Self { dir, posts })
    }

    /// Load the directory again, keeping the current snapshot on failure
    pub fn reload(&mut self) -> Result<(), LoadError> {
        *self = Self::load(&self.dir)?;
        Ok(())
    }

    /// Build an index from posts already in memory
    pub fn from_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        Self {
            dir: PathBuf::new(),
            posts: posts.into_iter().map(|p| (p.slug.clone(), p)).collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// All posts in load order
    pub fn all(&self) -> Vec<&Post> {
        self.posts.values().collect()
    }

    /// Post for `slug`; `None` is the not-found result
    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.posts.get(slug)
    }

    /// Posts carrying `tag`, in load order
    pub fn filter_by_tag(&self, tag: &str) -> Vec<&Post> {
        self.posts.values().filter(|p| p.has_tag(tag)).collect()
    }

    /// Posts carrying every tag in `tags`; all posts when `tags` is empty
    pub fn filter_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<&Post> {
        self.posts
            .values()
            .filter(|p| tags.iter().all(|t| p.has_tag(t.as_ref())))
            .collect()
    }

    /// Every tag used by any post, sorted and deduplicated
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .posts
            .values()
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }

    /// Tags with the number of posts using each, most used first
    pub fn tag_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for tag in self.tags() {
            counts.insert(tag, 0);
        }
        for post in self.posts.values() {
            for tag in &post.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.posts.values().any(|p| p.has_tag(tag))
    }
}

fn read_artifact(path: &Path) -> Result<Post, LoadError> {
    let corrupt = |reason: String| LoadError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let post: Post = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if post.slug != stem {
        return Err(corrupt(format!(
            "slug {:?} does not match file name",
            post.slug
        )));
    }
    if post.minutes_to_read < 1 {
        return Err(corrupt("minutesToRead must be at least 1".to_string()));
    }
    if let Some(h) = post.headings.iter().find(|h| !(1..=6).contains(&h.level)) {
        return Err(corrupt(format!(
            "heading {:?} has level {}",
            h.text, h.level
        )));
    }

    Ok(post)
}
