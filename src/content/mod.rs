//! Content module - front matter, validation, rendering and derived metadata

pub mod assets;
pub mod attributes;
pub mod error;
pub mod frontmatter;
mod markdown;
pub mod metadata;
mod post;

pub use assets::{resolve_assets, AssetResolver, VersionedAssets};
pub use attributes::{validate, CoverAttributes, PostAttributes};
pub use error::{ParseError, RenderConsistencyError, TemplateError, ValidationError};
pub use frontmatter::{extract, Extracted};
pub use markdown::{MarkdownRenderer, Renderer};
pub use post::{Cover, Heading, Post};

#[cfg(test)]
pub(crate) use post::fixtures;
