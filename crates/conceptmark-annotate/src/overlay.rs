//! Span overlay renderer.
//!
//! Walks the entity map in ascending offset order and lays out the source
//! text with every mention wrapped in an annotation. Mentions sharing an
//! offset nest shortest-inside-longest. A mention fully inside the term
//! anchored just before it is spliced in as a child annotation; one that
//! starts inside but runs past it gets the shared tail emphasised instead.
//! Text already covered by an earlier mention is never emitted twice.
//!
//! Offsets and lengths are counted in UTF-16 code units, as the recognition
//! service reports them.

use tracing::debug;

use conceptmark_common::{EntityRecord, Result};

use crate::entity_map::{EntityMap, MapEntry};
use crate::groups::SemanticGroupCatalog;
use crate::markup::{self, Annotation, Segment, WrapStyle};

/// A bucket of terms anchored at one offset.
type Bucket<'m> = (usize, &'m [MapEntry]);

pub struct OverlayRenderer<'c> {
    catalog: &'c SemanticGroupCatalog,
}

impl<'c> OverlayRenderer<'c> {
    pub fn new(catalog: &'c SemanticGroupCatalog) -> Self {
        Self { catalog }
    }

    /// Render annotated HTML for `text` and its entity records.
    pub fn render(&self, text: &str, records: &[EntityRecord]) -> Result<String> {
        self.render_map(text, &EntityMap::build(records))
    }

    pub fn render_map(&self, text: &str, map: &EntityMap) -> Result<String> {
        Ok(markup::to_html(&self.layout(text, map)?))
    }

    /// Lay out the trimmed text as plain and annotated segments.
    pub fn layout(&self, text: &str, map: &EntityMap) -> Result<Vec<Segment>> {
        let units = utf16(text.trim());
        let buckets: Vec<Bucket<'_>> = map.iter().collect();

        let mut segments = Vec::with_capacity(buckets.len() * 2 + 1);
        let mut last_end = 0;

        for (idx, &(pos, terms)) in buckets.iter().enumerate() {
            if pos >= last_end {
                push_text(&mut segments, slice(&units, last_end, pos));
            }

            let next = buckets.get(idx + 1).copied();
            match self.nest_bucket(pos, terms, last_end, next)? {
                Some(annotation) => segments.push(Segment::Annotation(Box::new(annotation))),
                None => debug!(pos, "mention fully covered by an earlier annotation"),
            }

            let end = pos + terms.first().map_or(0, MapEntry::utf16_len);
            last_end = last_end.max(end);
        }

        push_text(&mut segments, slice(&units, last_end, units.len()));
        Ok(segments)
    }

    /// Build the nested annotation for one bucket, innermost (shortest) first.
    ///
    /// `last_end` is where already emitted output stops; `next` is the bucket
    /// at the following offset, used to detect contained and intersecting
    /// mentions. Returns `None` when every term is hidden by earlier output.
    fn nest_bucket(
        &self,
        pos: usize,
        terms: &[MapEntry],
        last_end: usize,
        next: Option<Bucket<'_>>,
    ) -> Result<Option<Annotation>> {
        let count = terms.len();
        let intersected = pos < last_end;
        let skip = if intersected { last_end - pos } else { 0 };

        let mut inner: Option<(Annotation, String)> = None;

        for (i, entry) in terms.iter().enumerate().rev() {
            let term_units = utf16(&entry.text);
            let shown = slice(&term_units, skip, term_units.len());
            if shown.is_empty() {
                continue;
            }
            let shown_len = term_units.len() - skip;

            let mut style = if intersected {
                WrapStyle::Continuation
            } else if count > 1 && i < count - 1 {
                WrapStyle::Padding(count - i)
            } else {
                WrapStyle::Plain
            };

            // Content is the inner wrapper (if any) followed by this term's own text.
            let mut content = Vec::new();
            let own_start = match inner.take() {
                Some((child, child_shown)) => {
                    content.push(Segment::Annotation(Box::new(child)));
                    let rest = remainder(&shown, &child_shown);
                    let start = shown_len - rest.encode_utf16().count();
                    if !rest.is_empty() {
                        content.push(Segment::Text(rest.to_string()));
                    }
                    start
                }
                None => {
                    content.push(Segment::Text(shown.clone()));
                    0
                }
            };

            if let Some((next_pos, next_terms)) = next {
                let shown_start = pos + skip;
                let term_end = pos + entry.utf16_len();

                if next_pos >= shown_start && next_pos < term_end {
                    let rel = next_pos - shown_start;
                    let next_end = next_pos + next_terms.first().map_or(0, MapEntry::utf16_len);

                    if next_end <= term_end {
                        if let Some(child) = self.nest_bucket(next_pos, next_terms, 0, None)? {
                            let child_len = next_end - next_pos;
                            if splice_child(&mut content, own_start, rel, child_len, child) {
                                style = WrapStyle::Nested;
                            }
                        }
                    } else {
                        emphasise_tail(&mut content, own_start, rel);
                    }
                }
            }

            let classes = self.catalog.classify_many(&entry.ids)?.css();
            let color = self.catalog.color_for(&classes).to_string();

            let annotation = Annotation {
                offset: pos,
                classes,
                color,
                ids: entry.ids.clone(),
                whole_term: intersected.then(|| entry.text.clone()),
                style,
                content,
            };
            inner = Some((annotation, shown));
        }

        Ok(inner.map(|(annotation, _)| annotation))
    }
}

/// Render annotated HTML with the given catalog.
pub fn render(catalog: &SemanticGroupCatalog, text: &str, records: &[EntityRecord]) -> Result<String> {
    OverlayRenderer::new(catalog).render(text, records)
}

fn utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// Code units `[from, to)` of `units`, clamped to its bounds.
fn slice(units: &[u16], from: usize, to: usize) -> String {
    let to = to.min(units.len());
    if from >= to {
        return String::new();
    }
    String::from_utf16_lossy(&units[from..to])
}

fn push_text(segments: &mut Vec<Segment>, text: String) {
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
}

/// Part of `outer` following the shorter same-offset term `inner`.
fn remainder<'a>(outer: &'a str, inner: &str) -> &'a str {
    if let Some(rest) = outer.strip_prefix(inner) {
        return rest;
    }
    match outer.find(inner) {
        Some(at) => &outer[at + inner.len()..],
        None => outer,
    }
}

/// Replace `child_len` characters of the trailing own text, starting at `rel`
/// (relative to the shown term), with `child`. The own text starts at
/// `own_start`. Returns false when the child does not lie within it.
fn splice_child(
    content: &mut Vec<Segment>,
    own_start: usize,
    rel: usize,
    child_len: usize,
    child: Annotation,
) -> bool {
    if rel < own_start {
        return false;
    }
    let Some(Segment::Text(own)) = content.last() else {
        return false;
    };

    let own_units = utf16(own);
    let from = rel - own_start;
    let to = from + child_len;
    if to > own_units.len() {
        return false;
    }

    let before = slice(&own_units, 0, from);
    let after = slice(&own_units, to, own_units.len());
    content.pop();
    push_text(content, before);
    content.push(Segment::Annotation(Box::new(child)));
    push_text(content, after);
    true
}

/// Emphasise the trailing own text from `rel` on (the part shared with an
/// intersecting mention). When the intersection starts before the own text,
/// all of it is shared.
fn emphasise_tail(content: &mut Vec<Segment>, own_start: usize, rel: usize) {
    let Some(Segment::Text(own)) = content.last() else {
        return;
    };

    let own_units = utf16(own);
    let from = rel.saturating_sub(own_start).min(own_units.len());
    let before = slice(&own_units, 0, from);
    let shared = slice(&own_units, from, own_units.len());
    if shared.is_empty() {
        return;
    }

    content.pop();
    push_text(content, before);
    content.push(Segment::Emphasis(shared));
}
