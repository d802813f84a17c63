//! Annotation markup tree and its HTML serialisation.
//!
//! The overlay renderer first lays out a list of [`Segment`]s and only then
//! writes HTML, so nesting decisions can be inspected without parsing markup.

use std::sync::OnceLock;

use html_escape::encode_safe;
use regex::Regex;

/// A piece of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Raw text, escaped on output.
    Text(String),
    /// Raw text shared with an intersecting mention, wrapped in `<em>`.
    Emphasis(String),
    Annotation(Box<Annotation>),
}

/// Inline style of an annotation wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapStyle {
    Plain,
    /// Outer wrapper of a same-offset stack, padded by its depth.
    Padding(usize),
    /// Continuation of a span cut by an earlier intersecting mention.
    Continuation,
    /// Wrapper holding a child annotation spliced from a later offset.
    Nested,
}

impl WrapStyle {
    fn css(self) -> Option<String> {
        match self {
            WrapStyle::Plain => None,
            WrapStyle::Padding(depth) => Some(format!("padding:{depth}px 2px")),
            WrapStyle::Continuation => Some("border-left:0".to_string()),
            WrapStyle::Nested => Some("padding: 2px 2px".to_string()),
        }
    }
}

/// One highlighted mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub offset: usize,
    /// Group classes, e.g. `disorder` or `disorder gene-protein ambiguous`.
    pub classes: String,
    /// Color token; empty for ambiguous mentions.
    pub color: String,
    pub ids: Vec<String>,
    /// Full term text when only part of it is shown.
    pub whole_term: Option<String>,
    pub style: WrapStyle,
    pub content: Vec<Segment>,
}

impl Annotation {
    pub fn write_html(&self, out: &mut String) {
        let mut class = format!("at-{} annotation", self.offset);
        for extra in [&self.classes, &self.color] {
            if !extra.is_empty() {
                class.push(' ');
                class.push_str(extra);
            }
        }

        out.push_str("<span class=\"");
        out.push_str(&encode_safe(&class));
        out.push_str("\" data-concept-ids=\"");
        out.push_str(&encode_safe(&self.ids.join(";")));
        out.push('"');
        if let Some(term) = &self.whole_term {
            out.push_str(" data-term=\"");
            out.push_str(&encode_safe(term));
            out.push('"');
        }
        if let Some(style) = self.style.css() {
            out.push_str(" style=\"");
            out.push_str(&style);
            out.push('"');
        }
        out.push('>');
        write_segments(&self.content, out);
        out.push_str("</span>");
    }

    /// Visible text with all markup removed.
    pub fn plain_text(&self) -> String {
        plain_text(&self.content)
    }

    /// Child annotations directly inside this wrapper.
    pub fn children(&self) -> impl Iterator<Item = &Annotation> {
        self.content.iter().filter_map(|s| match s {
            Segment::Annotation(a) => Some(a.as_ref()),
            _ => None,
        })
    }
}

pub fn to_html(segments: &[Segment]) -> String {
    let mut out = String::new();
    write_segments(segments, &mut out);
    out
}

fn write_segments(segments: &[Segment], out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(&escape_text(text)),
            Segment::Emphasis(text) => {
                out.push_str("<em>");
                out.push_str(&escape_text(text));
                out.push_str("</em>");
            }
            Segment::Annotation(annotation) => annotation.write_html(out),
        }
    }
}

pub fn plain_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::Text(t) | Segment::Emphasis(t) => t.clone(),
            Segment::Annotation(a) => a.plain_text(),
        })
        .collect()
}

// ── Escaping ─────────────────────────────────────────────────────────────────

fn line_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r\n|\r|\n").expect("valid line break pattern"))
}

fn space_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2}|\t").expect("valid space run pattern"))
}

/// Turn line breaks into `<br/>` and space pairs or tabs into `&nbsp; `.
pub fn normalize_whitespace(html: &str) -> String {
    let html = line_breaks().replace_all(html, "<br/>");
    space_runs().replace_all(&html, "&nbsp; ").into_owned()
}

/// HTML-escape text content and keep its visual whitespace.
pub fn escape_text(text: &str) -> String {
    normalize_whitespace(&encode_safe(text))
}
