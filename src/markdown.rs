//! Markdown to HTML conversion for daily notes
//!
//! Notes are rendered with GitHub Flavored Markdown extensions. Raw HTML in a
//! note is not trusted: only `<source src="...">` passes through, every other
//! tag is dropped, and the contents of script-like elements are removed.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(/?)([A-Za-z][A-Za-z0-9-]*)([^>]*)>|<!--.*?-->").expect("valid regex")
});

static SRC_ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)src\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid regex")
});

/// Tags passed through, with the attributes each may keep
const ALLOWED_TAGS: &[(&str, &[&str])] = &[("source", &["src"])];

/// Elements whose contents are dropped along with the tags
const DROPPED_CONTENT_TAGS: &[&str] = &["script", "style", "textarea", "noscript", "iframe", "title"];

/// URL schemes allowed in links, images and allowed attributes
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_GFM
}

/// Convert a note's markdown to sanitized HTML.
#[must_use]
pub fn render(markdown: &str) -> String {
    let mut sanitizer = HtmlSanitizer::default();

    let events = Parser::new_ext(markdown, parser_options()).map(|event| match event {
        Event::Html(raw) => Event::Html(sanitizer.clean(&raw).into()),
        Event::InlineHtml(raw) => Event::InlineHtml(sanitizer.clean(&raw).into()),
        Event::Text(_) | Event::Code(_) if sanitizer.is_dropping() => Event::Text("".into()),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}

fn safe_destination(dest_url: CowStr<'_>) -> CowStr<'_> {
    if is_allowed_url(&dest_url) {
        dest_url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Relative URLs are allowed, absolute ones only with an allowed scheme.
fn is_allowed_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => ALLOWED_SCHEMES.contains(&parsed.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

/// Filters raw HTML fragments against the tag allow-list.
///
/// pulldown-cmark hands raw HTML over in pieces, so the sanitizer remembers
/// when it is inside an element whose contents must be dropped.
#[derive(Debug, Default)]
struct HtmlSanitizer {
    dropping: Option<String>,
}

impl HtmlSanitizer {
    fn is_dropping(&self) -> bool {
        self.dropping.is_some()
    }

    fn clean(&mut self, raw: &str) -> String {
        let mut output = String::with_capacity(raw.len());
        let mut last = 0;

        for caps in TAG_PATTERN.captures_iter(raw) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            self.push_text(&mut output, &raw[last..whole.start()]);
            last = whole.end();

            // comments
            let Some(name) = caps.get(2) else {
                continue;
            };

            let name = name.as_str().to_ascii_lowercase();
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let attributes = caps.get(3).map_or("", |m| m.as_str());

            if let Some(dropping) = &self.dropping {
                if closing && *dropping == name {
                    self.dropping = None;
                }
                continue;
            }

            if !closing && DROPPED_CONTENT_TAGS.contains(&name.as_str()) {
                if !attributes.trim_end().ends_with('/') {
                    self.dropping = Some(name);
                }
                continue;
            }

            if let Some(allowed) = allowed_tag(&name, attributes, closing) {
                output.push_str(&allowed);
            }
        }

        self.push_text(&mut output, &raw[last..]);
        output
    }

    fn push_text(&self, output: &mut String, text: &str) {
        if self.dropping.is_some() {
            return;
        }
        for c in text.chars() {
            match c {
                '<' => output.push_str("&lt;"),
                '>' => output.push_str("&gt;"),
                _ => output.push(c),
            }
        }
    }
}

/// Rebuild an allow-listed tag with only its allowed attributes.
fn allowed_tag(name: &str, attributes: &str, closing: bool) -> Option<String> {
    let (_, allowed_attributes) = ALLOWED_TAGS.iter().find(|(tag, _)| *tag == name)?;

    if closing {
        return Some(format!("</{name}>"));
    }

    let mut tag = format!("<{name}");
    if allowed_attributes.contains(&"src") {
        if let Some(src) = SRC_ATTRIBUTE_PATTERN
            .captures(attributes)
            .and_then(|caps| caps.get(1).or(caps.get(2)).or(caps.get(3)))
            .map(|m| m.as_str())
            .filter(|src| is_allowed_url(src))
        {
            tag.push_str(&format!(" src=\"{}\"", escape_attribute(src)));
        }
    }
    tag.push('>');
    Some(tag)
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
