//! Tag-stream parser: raw AI content → ordered sections → ordered blocks.
//!
//! The model is instructed to answer with a small fixed tag vocabulary:
//! `<h3>` section titles, `<p>` paragraphs, `<ul>`/`<li>` lists and
//! `<strong>`/`<b>` emphasis. This module never builds a DOM; it scans the
//! text with a handful of case-insensitive regexes, in one forward pass:
//!
//! 1. Newlines become spaces.
//! 2. Each `<h3>…</h3>` opens a section whose body runs to the next `<h3>`
//!    (terminated or not) or to the end of the input.
//! 3. Inside a body, only `<ul>…</ul>` and `<p>…</p>` chunks are kept.
//!    Anything between them is dropped and reported as a
//!    [`ContentWarning::DroppedText`].
//!    Text before the first heading is dropped the same way
//!    ([`ContentWarning::DroppedPreamble`]).
//! 4. No heading at all → one fallback section holding the whole input,
//!    tags stripped, as a single paragraph.
//!
//! Malformed or unterminated markup simply fails to match. The parser never
//! returns an error.

use crate::error::ContentWarning;
use crate::pipeline::sanitize::sanitize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use tracing::debug;

// ── Regex statics ────────────────────────────────────────────────────────

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h3>(.*?)</h3>").unwrap());

static HEADING_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<h3>").unwrap());

static CHUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)(<ul>.*?</ul>)|(<p>.*?</p>)").unwrap());

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<li>(.*?)</li>").unwrap());

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<]+?>").unwrap());

// ── Types ────────────────────────────────────────────────────────────────

/// One titled region of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Trimmed, sanitised heading text. Empty for the fallback section.
    pub title: String,
    pub blocks: Vec<Block>,
    /// `true` when the content had no headings and this section holds the
    /// whole input as plain text.
    pub fallback: bool,
}

/// A renderable unit inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String },
    List { items: Vec<String> },
}

/// Parser output: sections plus everything that was degraded on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReport {
    pub sections: Vec<Section>,
    pub warnings: Vec<ContentWarning>,
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Parse `raw` into ordered sections. See the module docs for the rules.
pub fn parse_sections(raw: &str) -> Vec<Section> {
    parse_report(raw).sections
}

/// Parse `raw`, also collecting [`ContentWarning`]s for dropped content.
pub fn parse_report(raw: &str) -> ParsedReport {
    let normalized = raw.replace('\n', " ");
    let mut warnings = Vec::new();

    let mut sections = Vec::new();
    let mut pos = 0;
    while let Some(caps) = HEADING.captures_at(&normalized, pos) {
        let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if sections.is_empty() {
            let preamble = residual_chars(&normalized[..whole.start()]);
            if preamble > 0 {
                warnings.push(ContentWarning::DroppedPreamble { chars: preamble });
            }
        }

        let body_start = whole.end();
        let body_end = HEADING_OPEN
            .find_at(&normalized, body_start)
            .map_or(normalized.len(), |m| m.start());

        let title = sanitize(title.as_str().trim());
        let body = &normalized[body_start..body_end];
        let (blocks, dropped) = parse_body(body);

        if dropped > 0 {
            warnings.push(ContentWarning::DroppedText {
                section: title.clone(),
                chars: dropped,
            });
        }
        if blocks.is_empty() {
            warnings.push(ContentWarning::EmptySection {
                section: title.clone(),
            });
        }
        sections.push(Section {
            title,
            blocks,
            fallback: false,
        });
        pos = body_end;
    }

    if sections.is_empty() {
        warnings.push(if raw.trim().is_empty() {
            ContentWarning::EmptyContent
        } else {
            ContentWarning::NoHeadings
        });
        sections.push(Section {
            title: String::new(),
            blocks: vec![Block::Paragraph {
                text: sanitize(&strip_tags(&normalized)),
            }],
            fallback: true,
        });
    }

    debug!(
        "Parsed {} section(s), {} warning(s)",
        sections.len(),
        warnings.len()
    );
    ParsedReport { sections, warnings }
}

/// Remove every `<…>` tag, leaving the text between them.
pub fn strip_tags(text: &str) -> Cow<'_, str> {
    TAG.replace_all(text, "")
}

// ── Body ─────────────────────────────────────────────────────────────────

/// Split a section body into blocks. Returns the blocks and the number of
/// non-whitespace characters that fell outside any chunk.
fn parse_body(body: &str) -> (Vec<Block>, usize) {
    let mut blocks = Vec::new();
    let mut dropped = 0;
    let mut last = 0;

    for caps in CHUNK.captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        dropped += residual_chars(&body[last..whole.start()]);
        last = whole.end();

        if let Some(list) = caps.get(1) {
            blocks.push(Block::List {
                items: list_items(list.as_str()),
            });
        } else if let Some(para) = caps.get(2) {
            blocks.push(Block::Paragraph {
                text: sanitize(strip_tags(para.as_str()).trim()),
            });
        }
    }
    dropped += residual_chars(&body[last..]);

    (blocks, dropped)
}

fn list_items(list: &str) -> Vec<String> {
    LIST_ITEM
        .captures_iter(list)
        .filter_map(|c| c.get(1))
        .map(|item| sanitize(strip_tags(item.as_str()).trim()))
        .collect()
}

fn residual_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sanitize::BULLET;

    fn para(text: &str) -> Block {
        Block::Paragraph { text: text.into() }
    }

    fn list(items: &[&str]) -> Block {
        Block::List {
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn one_section_per_heading_in_order() {
        let raw = "<h3>1. A</h3><p>a</p><h3>2. B</h3><p>b</p><h3>3. C</h3>";
        let s = parse_sections(raw);
        let titles: Vec<_> = s.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["1. A", "2. B", "3. C"]);
        assert!(s.iter().all(|s| !s.fallback));
    }

    #[test]
    fn fallback_without_headings() {
        let parsed = parse_report("Plain <i>text</i>\nhere");
        assert_eq!(parsed.sections.len(), 1);
        let s = &parsed.sections[0];
        assert!(s.fallback);
        assert_eq!(s.title, "");
        assert_eq!(s.blocks, vec![para("Plain text here")]);
        assert_eq!(parsed.warnings, vec![ContentWarning::NoHeadings]);
    }

    #[test]
    fn empty_content_is_fallback_with_empty_text() {
        let parsed = parse_report("");
        assert_eq!(parsed.sections[0].blocks, vec![para("")]);
        assert_eq!(parsed.warnings, vec![ContentWarning::EmptyContent]);
    }

    #[test]
    fn list_items_are_cleaned() {
        let s = parse_sections("<h3>T</h3><ul><li>A</li><li><strong>B</strong></li></ul>");
        assert_eq!(s[0].blocks, vec![list(&["A", "B"])]);
    }

    #[test]
    fn empty_list_items_are_kept() {
        let s = parse_sections("<h3>T</h3><ul><li> </li><li>x</li></ul>");
        assert_eq!(s[0].blocks, vec![list(&["", "x"])]);
    }

    #[test]
    fn paragraph_and_list_in_order() {
        let raw = "<h3>1. DETAILED CLINICAL OBSERVATION</h3><p>Low platelets.</p>\
                   <ul><li>Point 1</li><li>Point 2</li></ul>";
        let s = parse_sections(raw);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].title, "1. DETAILED CLINICAL OBSERVATION");
        assert_eq!(
            s[0].blocks,
            vec![para("Low platelets."), list(&["Point 1", "Point 2"])]
        );
    }

    #[test]
    fn unterminated_paragraph_yields_no_blocks() {
        let parsed = parse_report("<h3>X</h3><p>unterminated");
        assert_eq!(parsed.sections.len(), 1);
        assert!(parsed.sections[0].blocks.is_empty());
        assert!(parsed.warnings.contains(&ContentWarning::EmptySection {
            section: "X".into()
        }));
    }

    #[test]
    fn residual_text_is_dropped_and_reported() {
        let parsed = parse_report("<h3>X</h3>stray words<p>kept</p> tail");
        assert_eq!(parsed.sections[0].blocks, vec![para("kept")]);
        assert_eq!(
            parsed.warnings,
            vec![ContentWarning::DroppedText {
                section: "X".into(),
                chars: 14
            }]
        );
    }

    #[test]
    fn text_before_first_heading_is_reported() {
        let parsed = parse_report("pre<p>lost</p> <h3>T</h3><p>k</p>");
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[0].blocks, vec![para("k")]);
        assert_eq!(
            parsed.warnings,
            vec![ContentWarning::DroppedPreamble { chars: 14 }]
        );
    }

    #[test]
    fn tags_are_case_insensitive() {
        let s = parse_sections("<H3>Up</H3><P>para</P><UL><LI>i</LI></UL>");
        assert_eq!(s[0].title, "Up");
        assert_eq!(s[0].blocks, vec![para("para"), list(&["i"])]);
    }

    #[test]
    fn newlines_become_spaces() {
        let s = parse_sections("<h3>T</h3>\n<p>line one\nline two</p>");
        assert_eq!(s[0].blocks, vec![para("line one line two")]);
    }

    #[test]
    fn unterminated_heading_ends_previous_body() {
        let s = parse_sections("<h3>A</h3><p>a</p><h3>B never closed <p>b</p>");
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].blocks, vec![para("a")]);
    }

    #[test]
    fn title_is_trimmed_and_sanitized() {
        let s = parse_sections("<h3>  4. DIET \u{2013} PLAN  </h3><p>x</p>");
        assert_eq!(s[0].title, "4. DIET - PLAN");
    }

    #[test]
    fn bullets_in_items_map_to_winansi() {
        let s = parse_sections("<h3>T</h3><ul><li>\u{2022} dot</li></ul>");
        assert_eq!(s[0].blocks, vec![list(&[&format!("{BULLET} dot")])]);
    }

    #[test]
    fn whitespace_between_chunks_is_not_a_warning() {
        let parsed = parse_report("<h3>T</h3>  <p>a</p>   <p>b</p>  ");
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.sections[0].blocks.len(), 2);
    }

    #[test]
    fn strip_tags_removes_any_tag() {
        assert_eq!(strip_tags("<a href='x'>link</a> <br/>ok"), "link ok");
    }

    #[test]
    fn blocks_serialise_with_kind() {
        let json = serde_json::to_string(&para("x")).unwrap();
        assert_eq!(json, r#"{"kind":"paragraph","text":"x"}"#);
    }
}
