//! Metadata derived from a rendered document

use chrono::NaiveDate;
use lol_html::{element, text, HtmlRewriter, Settings};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use super::error::RenderConsistencyError;
use super::post::Heading;
use crate::config::DateStyle;

/// Reading speed used for `minutes_to_read`
pub const WORDS_PER_MINUTE: usize = 200;

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";
const HEADING_ANCHORS: &str = "h1 a[href], h2 a[href], h3 a[href], h4 a[href], h5 a[href], h6 a[href]";

/// Estimated reading time in whole minutes, never less than one
pub fn minutes_to_read(markdown: &str) -> u32 {
    let words = markdown.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Display form of a publish date
pub fn format_date(date: &NaiveDate, style: DateStyle) -> String {
    match style {
        DateStyle::Long => date.format("%B %-d, %Y").to_string(),
        DateStyle::Short => date.format("%b %-d, %Y").to_string(),
    }
}

#[derive(Default)]
struct RawHeading {
    level: u8,
    text: String,
    href: Option<String>,
}

/// Read the table of contents back out of rendered HTML.
///
/// Headings are returned in document order. Each must contain text and an
/// `<a href>`; the first such anchor provides the heading's link.
pub fn extract_headings(html: &str) -> Result<Vec<Heading>, RenderConsistencyError> {
    let found: Rc<RefCell<Vec<RawHeading>>> = Rc::new(RefCell::new(Vec::new()));

    let on_heading = Rc::clone(&found);
    let on_anchor = Rc::clone(&found);
    let on_text = Rc::clone(&found);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!(HEADINGS, move |el| {
                    let level = el.tag_name()[1..].parse::<u8>().unwrap_or_default();
                    on_heading.borrow_mut().push(RawHeading {
                        level,
                        ..Default::default()
                    });
                    Ok(())
                }),
                element!(HEADING_ANCHORS, move |el| {
                    if let Some(current) = on_anchor.borrow_mut().last_mut() {
                        if current.href.is_none() {
                            current.href = el.get_attribute("href");
                        }
                    }
                    Ok(())
                }),
                text!(HEADINGS, move |chunk| {
                    if let Some(current) = on_text.borrow_mut().last_mut() {
                        current.text.push_str(chunk.as_str());
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |_: &[u8]| {},
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| RenderConsistencyError::Html(e.to_string()))?;
    rewriter
        .end()
        .map_err(|e| RenderConsistencyError::Html(e.to_string()))?;

    let raw = found.take();
    raw.into_iter()
        .map(|heading| {
            let decoded = html_escape::decode_html_entities(&heading.text);
            let text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return Err(RenderConsistencyError::MissingText {
                    level: heading.level,
                });
            }
            match heading.href {
                Some(href) => Ok(Heading {
                    text,
                    level: heading.level,
                    href,
                }),
                None => Err(RenderConsistencyError::MissingAnchor {
                    level: heading.level,
                    text,
                }),
            }
        })
        .collect()
}

/// Pixel size of an image file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Read an image's dimensions from its header, if the format is recognized
pub fn probe_dimensions(path: &Path) -> Option<Dimensions> {
    match imagesize::size(path) {
        Ok(size) => Some(Dimensions {
            width: u32::try_from(size.width).ok()?,
            height: u32::try_from(size.height).ok()?,
        }),
        Err(e) => {
            tracing::debug!("Could not read image size of {:?}: {}", path, e);
            None
        }
    }
}
