//! Markdown rendering with syntax highlighting and linkable headings

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Turns markdown into HTML.
///
/// Every heading in the output must carry an `<a href>` descendant pointing at
/// the heading itself; the table of contents is read back from those anchors.
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String>;
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

/// Heading collected between its start and end events
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    events: Vec<Event<'a>>,
}

struct PendingCode {
    lang: Option<String>,
    content: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    fn push_heading(&self, out: &mut Vec<Event<'_>>, heading: PendingHeading<'_>) {
        let id = heading
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| slug::slugify(&heading.text));
        let id = if id.is_empty() { "section".to_string() } else { id };
        let id = html_escape::encode_double_quoted_attribute(&id);

        let class_attr = if heading.classes.is_empty() {
            String::new()
        } else {
            format!(
                r#" class="{}""#,
                html_escape::encode_double_quoted_attribute(&heading.classes.join(" "))
            )
        };

        let mut inner = String::new();
        html::push_html(&mut inner, heading.events.into_iter());

        out.push(Event::Html(CowStr::from(format!(
            r##"<{tag} id="{id}"{class_attr}><a class="anchor" aria-hidden="true" tabindex="-1" href="#{id}"></a>{inner}</{tag}>"##,
            tag = heading.level,
        ))));
        out.push(Event::Html(CowStr::from("\n")));
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        // Try to find syntax for the language
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let highlighted = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
            .and_then(|theme| {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
            });

        let class = html_escape::encode_double_quoted_attribute(lang);
        match highlighted {
            Some(highlighted) if self.line_numbers => self.add_line_numbers(&highlighted, &class),
            Some(highlighted) => format!(
                r#"<div class="highlight highlight-source-{}">{}</div>"#,
                class, highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                class,
                html_escape::encode_text(code)
            ),
        }
    }

    /// Add line numbers to highlighted code; `class` must already be attribute-escaped
    fn add_line_numbers(&self, code: &str, class: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
            class,
            gutter,
            lines.join("\n")
        )
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String> {
        // Front matter is stripped before rendering, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code: Option<PendingCode> = None;
        let mut heading: Option<PendingHeading> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split([' ', ','])
                            .next()
                            .filter(|l| !l.is_empty())
                            .map(str::to_lowercase),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some(PendingCode {
                        lang,
                        content: String::new(),
                    });
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code.take() {
                        let highlighted = self.highlight_code(&block.content, block.lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some(block) = code.as_mut() {
                        block.content.push_str(&text);
                    }
                }
                Event::Start(Tag::Heading {
                    level, id, classes, ..
                }) => {
                    heading = Some(PendingHeading {
                        level,
                        id: id.map(|id| id.to_string()),
                        classes: classes.iter().map(|c| c.to_string()).collect(),
                        text: String::new(),
                        events: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(pending) = heading.take() {
                        self.push_heading(&mut events, pending);
                    }
                }
                other => match heading.as_mut() {
                    Some(pending) => {
                        if let Event::Text(text) | Event::Code(text) = &other {
                            pending.text.push_str(text);
                        }
                        pending.events.push(other);
                    }
                    None => events.push(other),
                },
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("Some *emphasis* here.").unwrap();
        assert!(html.contains("<p>Some <em>emphasis</em> here.</p>"));
    }

    #[test]
    fn test_headings_get_anchors() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Getting Started\n\nText.").unwrap();
        assert!(html.contains(
            r##"<h2 id="getting-started"><a class="anchor" aria-hidden="true" tabindex="-1" href="#getting-started"></a>Getting Started</h2>"##
        ));
    }

    #[test]
    fn test_heading_with_inline_code() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("### Using `serde`").unwrap();
        assert!(html.contains(r#"<h3 id="using-serde">"#));
        assert!(html.contains("<code>serde</code>"));
    }

    #[test]
    fn test_heading_custom_id() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Title {#custom .big}").unwrap();
        assert!(html.contains(r#"<h1 id="custom" class="big">"#));
        assert!(html.contains(r##"href="#custom""##));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains("highlight-source-rust"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_code_fence_language_is_escaped() {
        let source = "```a\"onclick=x\nbody\n```";
        for renderer in [
            MarkdownRenderer::new(),
            MarkdownRenderer::with_options("base16-ocean.dark", true),
        ] {
            let html = renderer.render(source).unwrap();
            assert!(!html.contains(r#"a"onclick"#), "{}", html);
            assert!(html.contains("a&quot;onclick=x"), "{}", html);
        }
    }

    #[test]
    fn test_line_numbers() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", true);
        let html = renderer.render("```\na\nb\n```").unwrap();
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
    }
}
