//! Sorting and tag filtering for index pages

use std::fmt;
use std::str::FromStr;

use super::PostIndex;
use crate::content::Post;

/// Display order of a post listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub const ALL: [SortOrder; 2] = [SortOrder::Newest, SortOrder::Oldest];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest",
            SortOrder::Oldest => "Oldest",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    /// Case-insensitive: `newest`, `Newest` and `NEWEST` are all accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort order {:?}, expected newest or oldest", s))
    }
}

/// Reorder posts by publish date; posts sharing a date keep their order
pub fn sort_by_date(mut posts: Vec<&Post>, order: SortOrder) -> Vec<&Post> {
    match order {
        SortOrder::Newest => posts.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::Oldest => posts.sort_by(|a, b| a.date.cmp(&b.date)),
    }
    posts
}

/// Tags requested by a listing page, checked against the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    requested: Vec<String>,
    valid: Vec<String>,
}

impl TagQuery {
    pub fn new<I, S>(index: &PostIndex, requested: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested: Vec<String> = requested.into_iter().map(Into::into).collect();
        let valid = requested
            .iter()
            .filter(|tag| index.has_tag(tag))
            .cloned()
            .collect();
        Self { requested, valid }
    }

    /// Requested tags that at least one post uses
    pub fn valid(&self) -> &[String] {
        &self.valid
    }

    /// Whether any requested tag is unknown to the index
    pub fn has_unknown(&self) -> bool {
        self.valid.len() != self.requested.len()
    }

    /// Posts carrying every valid tag
    pub fn apply<'a>(&self, index: &'a PostIndex) -> Vec<&'a Post> {
        index.filter_by_tags(&self.valid)
    }

    /// Tags of `visible` posts, sorted, each flagged when currently selected
    pub fn facet(&self, visible: &[&Post]) -> Vec<(String, bool)> {
        let mut tags: Vec<&str> = visible
            .iter()
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect();
        tags.sort_unstable();
        tags.dedup();
        tags.into_iter()
            .map(|tag| (tag.to_string(), self.valid.iter().any(|v| v == tag)))
            .collect()
    }
}
