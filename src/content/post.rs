//! Post model persisted as a build artifact

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A built post or blog entry.
///
/// This is exactly what gets written to `<slug>.json`; unknown fields are
/// rejected on load so artifacts from an older layout are caught early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Post {
    /// Directory name of the source document, primary key
    pub slug: String,

    /// Public URL path, e.g. `/posts/my-first-post`
    pub href: String,

    pub title: String,

    pub description: String,

    /// Publication date
    pub date: NaiveDate,

    /// Date as displayed, e.g. `January 5, 2024`
    pub formatted_date: String,

    pub tags: Vec<String>,

    pub minutes_to_read: u32,

    pub cover: Cover,

    /// Table of contents in document order
    pub headings: Vec<Heading>,

    /// Markdown after asset placeholders were resolved
    pub markdown: String,

    /// Rendered HTML
    pub html: String,
}

impl Post {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Cover image with its resolved URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Cover {
    pub resolved_image_path: String,
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One table-of-contents entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Heading {
    pub text: String,
    pub level: u8,
    pub href: String,
}
