//! `{{asset: "..."}}` placeholder resolution

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::error::TemplateError;

lazy_static! {
    static ref ASSET_PLACEHOLDER: Regex = Regex::new(r"\{\{\s*asset:\s*(.*?)\s*\}\}").unwrap();
    static ref STRING_LITERAL: Regex = Regex::new(r#"^"([^"]*)"$"#).unwrap();
}

/// Maps a prefixed asset path to the URL the page should reference
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, path: &str) -> String;
}

/// Appends `?v=<version>` to every asset when a version is configured
#[derive(Debug, Clone, Default)]
pub struct VersionedAssets {
    version: Option<String>,
}

impl VersionedAssets {
    pub fn new(version: Option<String>) -> Self {
        Self {
            version: version.filter(|v| !v.is_empty()),
        }
    }
}

impl AssetResolver for VersionedAssets {
    fn resolve(&self, path: &str) -> String {
        match &self.version {
            Some(version) => {
                let separator = if path.contains('?') { '&' } else { '?' };
                format!("{}{}v={}", path, separator, version)
            }
            None => path.to_string(),
        }
    }
}

/// Replace every asset placeholder in `markdown` with the resolved
/// `prefix + path` URL
pub fn resolve_assets(
    markdown: &str,
    prefix: &str,
    resolver: &dyn AssetResolver,
) -> Result<String, TemplateError> {
    // Validate first so a bad placeholder late in the file is reported
    // without doing any replacement work.
    for caps in ASSET_PLACEHOLDER.captures_iter(markdown) {
        if !STRING_LITERAL.is_match(&caps[1]) {
            return Err(TemplateError::NotAStringLiteral {
                placeholder: caps[0].to_string(),
            });
        }
    }

    let resolved = ASSET_PLACEHOLDER.replace_all(markdown, |caps: &Captures| {
        let literal = &caps[1];
        let path = &literal[1..literal.len() - 1];
        resolver.resolve(&format!("{}{}", prefix, path))
    });

    Ok(resolved.into_owned())
}
