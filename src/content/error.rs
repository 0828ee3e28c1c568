//! Error types for the content pipeline

use thiserror::Error;

/// The front-matter block exists but cannot be read
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("front matter opened on line 1 but was never closed")]
    Unclosed,

    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values, found {found}")]
    NotAMapping { found: &'static str },
}

/// A front-matter attribute is missing or has the wrong shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("front matter must have a `{field}` of type {expected}")]
    Missing {
        field: &'static str,
        expected: &'static str,
    },

    #[error("front matter `{field}` must be {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("front matter `{field}` must not be empty")]
    Empty { field: &'static str },

    #[error("front matter `{field}` is not a calendar date: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("front matter `tags` may only contain strings, element {index} is not one")]
    NonStringTag { index: usize },
}

impl ValidationError {
    /// Name of the offending attribute
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field, .. }
            | Self::WrongType { field, .. }
            | Self::Empty { field }
            | Self::InvalidDate { field, .. } => field,
            Self::NonStringTag { .. } => "tags",
        }
    }
}

/// An `{{asset: ...}}` placeholder is malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("asset placeholder `{placeholder}` must take a double-quoted string")]
    NotAStringLiteral { placeholder: String },
}

/// The renderer did not attach an anchor (or any text) to a heading
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderConsistencyError {
    #[error("h{level} heading {text:?} has no anchor with an href")]
    MissingAnchor { level: u8, text: String },

    #[error("h{level} heading has no text")]
    MissingText { level: u8 },

    #[error("rendered HTML could not be scanned: {0}")]
    Html(String),
}
