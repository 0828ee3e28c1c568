//! Front-matter extraction

use serde_yaml::{Mapping, Value};

use super::error::ParseError;

/// Attributes and body of a source document
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<'a> {
    /// Untyped front-matter attributes (empty when the document has none)
    pub attributes: Mapping,
    /// Template markdown following the front-matter block
    pub body: &'a str,
}

/// Split a document into its YAML front matter and its markdown body.
///
/// The block must open on the first non-blank line with `---` (or `---yaml`)
/// and close with a line holding only `---` or `...`. A document that does not
/// open a block is returned whole as body with no attributes.
pub fn extract(content: &str) -> Result<Extracted<'_>, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let trimmed = content.trim_start();

    let mut lines = trimmed.split_inclusive('\n');
    let opens_block = lines
        .next()
        .map(|first| matches!(first.trim_end(), "---" | "---yaml"))
        .unwrap_or(false);

    if !opens_block {
        return Ok(Extracted {
            attributes: Mapping::new(),
            body: content,
        });
    }

    let block_start = trimmed.find('\n').map(|i| i + 1).unwrap_or(trimmed.len());
    let mut offset = block_start;

    for line in lines {
        let line_start = offset;
        offset += line.len();

        if matches!(line.trim_end(), "---" | "...") {
            let yaml = &trimmed[block_start..line_start];
            let body = trimmed[offset..].trim_start_matches(['\n', '\r']);
            return Ok(Extracted {
                attributes: parse_mapping(yaml)?,
                body,
            });
        }
    }

    Err(ParseError::Unclosed)
}

fn parse_mapping(yaml: &str) -> Result<Mapping, ParseError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(mapping) => Ok(mapping),
        // A block holding only comments
        Value::Null => Ok(Mapping::new()),
        other => Err(ParseError::NotAMapping {
            found: value_kind(&other),
        }),
    }
}

/// Human-readable name of a YAML value's type, used in error messages
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
