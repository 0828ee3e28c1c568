//! Front-matter validation
//!
//! Turns the untyped attribute mapping produced by the extractor into a
//! [`PostAttributes`] record. Rules run in a fixed order and the first
//! violation is returned.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_yaml::{Mapping, Value};

use super::error::ValidationError;
use super::frontmatter::value_kind;
use crate::config::CollectionConfig;

/// Validated front matter of a post or blog entry
#[derive(Debug, Clone, PartialEq)]
pub struct PostAttributes {
    pub title: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub description: String,
    pub cover: CoverAttributes,
}

/// Cover image as written in the front matter, before path resolution
#[derive(Debug, Clone, PartialEq)]
pub struct CoverAttributes {
    /// File name relative to the document directory
    pub image_name: String,
    pub alt_text: String,
    pub caption: Option<String>,
}

/// Validate raw attributes against the rules of `collection`
pub fn validate(
    attrs: &Mapping,
    collection: &CollectionConfig,
) -> Result<PostAttributes, ValidationError> {
    let title = non_blank_string(attrs, "title")?;
    let date = calendar_date(attrs, "date")?;
    let description = required_string(attrs, "description")?;
    let tags = string_list(attrs, "tags")?;
    let cover = cover(attrs, collection)?;

    Ok(PostAttributes {
        title,
        date,
        tags,
        description,
        cover,
    })
}

fn lookup<'a>(attrs: &'a Mapping, key: &str) -> Option<&'a Value> {
    attrs.get(key).filter(|value| !value.is_null())
}

/// A present string, possibly blank
pub fn required_string(attrs: &Mapping, field: &'static str) -> Result<String, ValidationError> {
    match lookup(attrs, field) {
        None => Err(ValidationError::Missing {
            field,
            expected: "string",
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
            found: value_kind(other),
        }),
    }
}

/// A present string with at least one non-whitespace character
pub fn non_blank_string(attrs: &Mapping, field: &'static str) -> Result<String, ValidationError> {
    let value = required_string(attrs, field)?;
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(value)
}

/// A string if present; `field` names the attribute in errors
pub fn optional_string(
    attrs: &Mapping,
    key: &str,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match lookup(attrs, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
            found: value_kind(other),
        }),
    }
}

/// A required string holding a calendar date
pub fn calendar_date(attrs: &Mapping, field: &'static str) -> Result<NaiveDate, ValidationError> {
    let raw = match lookup(attrs, field) {
        None => {
            return Err(ValidationError::Missing {
                field,
                expected: "date string",
            })
        }
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(ValidationError::WrongType {
                field,
                expected: "a date string",
                found: value_kind(other),
            })
        }
    };

    parse_calendar_date(raw).ok_or_else(|| ValidationError::InvalidDate {
        field,
        value: raw.clone(),
    })
}

/// A list of strings, empty when absent
pub fn string_list(attrs: &Mapping, field: &'static str) -> Result<Vec<String>, ValidationError> {
    match lookup(attrs, field) {
        None => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ValidationError::NonStringTag { index }),
            })
            .collect(),
        Some(other) => Err(ValidationError::WrongType {
            field,
            expected: "a list of strings",
            found: value_kind(other),
        }),
    }
}

/// Cover image settings.
///
/// Accepts `cover: name.png`, a `cover:` mapping with `image`, `alt` and
/// `caption`, and the older top-level `coverPhoto` / `coverAltText` keys.
pub fn cover(
    attrs: &Mapping,
    collection: &CollectionConfig,
) -> Result<CoverAttributes, ValidationError> {
    let mut image = None;
    let mut alt = None;
    let mut caption = None;

    match lookup(attrs, "cover") {
        None => {}
        Some(Value::String(s)) => image = Some(s.clone()),
        Some(Value::Mapping(nested)) => {
            image = optional_string(nested, "image", "cover.image")?;
            alt = optional_string(nested, "alt", "cover.alt")?;
            caption = optional_string(nested, "caption", "cover.caption")?;
        }
        Some(other) => {
            return Err(ValidationError::WrongType {
                field: "cover",
                expected: "a string or a mapping",
                found: value_kind(other),
            })
        }
    }

    if image.is_none() {
        image = optional_string(attrs, "coverPhoto", "coverPhoto")?;
    }
    if alt.is_none() {
        alt = optional_string(attrs, "coverAltText", "coverAltText")?;
    }

    let image_name = match image {
        Some(name) if name.trim().is_empty() => {
            return Err(ValidationError::Empty { field: "cover" })
        }
        Some(name) => name,
        None if collection.require_cover => {
            return Err(ValidationError::Missing {
                field: "cover",
                expected: "string",
            })
        }
        None => collection.cover_defaults.image.clone(),
    };

    Ok(CoverAttributes {
        image_name,
        alt_text: alt.unwrap_or_else(|| collection.cover_defaults.alt.clone()),
        caption,
    })
}

/// Parse a date string in the formats front matter commonly uses
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // RFC 3339 keeps the calendar date as written, not shifted to UTC
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn posts() -> CollectionConfig {
        CollectionConfig::posts()
    }

    const MINIMAL: &str = r#"
title: Hello
date: 2024-01-15
description: A greeting
"#;

    #[test]
    fn test_defaults_applied() {
        let parsed = validate(&attrs(MINIMAL), &posts()).unwrap();
        assert_eq!(parsed.title, "Hello");
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(parsed.description, "A greeting");
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.cover.image_name, "cover.png");
        assert_eq!(parsed.cover.alt_text, "Cover");
        assert_eq!(parsed.cover.caption, None);
    }

    #[test]
    fn test_missing_title_names_title() {
        let err = validate(&attrs("date: 2024-01-15\ndescription: x"), &posts()).unwrap_err();
        assert_eq!(err.field(), "title");
        assert!(matches!(err, ValidationError::Missing { .. }));
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_first_violation_wins() {
        // Both title and description are missing; title is checked first.
        let err = validate(&attrs("date: 2024-01-15"), &posts()).unwrap_err();
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn test_required_string_rules() {
        let map = attrs("a: 3\nb: '  '\nc: null\nd: ok");
        assert_eq!(
            required_string(&map, "a"),
            Err(ValidationError::WrongType {
                field: "a",
                expected: "a string",
                found: "a number"
            })
        );
        assert_eq!(required_string(&map, "b"), Ok("  ".to_string()));
        assert_eq!(
            non_blank_string(&map, "b"),
            Err(ValidationError::Empty { field: "b" })
        );
        assert!(matches!(
            required_string(&map, "c"),
            Err(ValidationError::Missing { field: "c", .. })
        ));
        assert_eq!(required_string(&map, "d"), Ok("ok".to_string()));
    }

    #[test]
    fn test_blank_description_allowed() {
        let parsed = validate(
            &attrs("title: Hello\ndate: 2024-01-15\ndescription: \"\""),
            &posts(),
        )
        .unwrap();
        assert_eq!(parsed.description, "");

        let err = validate(
            &attrs("title: '   '\ndate: 2024-01-15\ndescription: x"),
            &posts(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "title" });
    }

    #[test]
    fn test_calendar_date_rules() {
        let map = attrs("a: 2024/03/09\nb: not a date\nc: 2024\nd: '2024-03-09T23:30:00-08:00'");
        assert_eq!(
            calendar_date(&map, "a"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
        assert!(matches!(
            calendar_date(&map, "b"),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            calendar_date(&map, "c"),
            Err(ValidationError::WrongType { .. })
        ));
        assert_eq!(
            calendar_date(&map, "d"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
    }

    #[test]
    fn test_string_list_rules() {
        let map = attrs("ok: [a, b]\nmixed: [a, 2]\nscalar: a");
        assert_eq!(string_list(&map, "ok").unwrap(), vec!["a", "b"]);
        assert_eq!(string_list(&map, "absent").unwrap(), Vec::<String>::new());
        assert_eq!(
            string_list(&map, "mixed"),
            Err(ValidationError::NonStringTag { index: 1 })
        );
        assert!(matches!(
            string_list(&map, "scalar"),
            Err(ValidationError::WrongType { .. })
        ));
    }

    #[test]
    fn test_cover_mapping() {
        let map = attrs("cover:\n  image: hero.jpg\n  alt: A hero\n  caption: Taken in 2020");
        let cover = cover(&map, &posts()).unwrap();
        assert_eq!(cover.image_name, "hero.jpg");
        assert_eq!(cover.alt_text, "A hero");
        assert_eq!(cover.caption.as_deref(), Some("Taken in 2020"));
    }

    #[test]
    fn test_cover_mapping_partial_uses_defaults() {
        let map = attrs("cover:\n  caption: Only a caption");
        let cover = cover(&map, &posts()).unwrap();
        assert_eq!(cover.image_name, "cover.png");
        assert_eq!(cover.alt_text, "Cover");
        assert_eq!(cover.caption.as_deref(), Some("Only a caption"));
    }

    #[test]
    fn test_cover_legacy_keys() {
        let map = attrs("cover: photo.png\ncoverAltText: Legacy alt");
        let cover = cover(&map, &posts()).unwrap();
        assert_eq!(cover.image_name, "photo.png");
        assert_eq!(cover.alt_text, "Legacy alt");

        let map = attrs("coverPhoto: blog.png");
        assert_eq!(
            super::cover(&map, &CollectionConfig::blogs())
                .unwrap()
                .image_name,
            "blog.png"
        );
    }

    #[test]
    fn test_cover_type_errors() {
        let map = attrs("cover: 12");
        assert!(matches!(
            cover(&map, &posts()),
            Err(ValidationError::WrongType { field: "cover", .. })
        ));

        let map = attrs("cover:\n  alt: [not, text]");
        assert!(matches!(
            cover(&map, &posts()),
            Err(ValidationError::WrongType {
                field: "cover.alt",
                ..
            })
        ));
    }

    #[test]
    fn test_required_cover() {
        let err = validate(&attrs(MINIMAL), &CollectionConfig::blogs()).unwrap_err();
        assert_eq!(err.field(), "cover");
    }
}
