//! Layout engine: parsed sections → positioned draw operations.
//!
//! Every section gets an accent "chip" carrying its title, followed by its
//! paragraphs and bulleted lists. Two thresholds keep headings and blocks
//! off the bottom edge:
//!
//! * a chip is never started below [`SECTION_BREAK_Y`] (a heading with no
//!   room for content under it moves to the next page);
//! * a block is never started below [`BLOCK_BREAK_Y`].
//!
//! Inside a block, the canvas breaks pages line by line at its trigger.

use crate::config::Theme;
use crate::pipeline::canvas::{Align, Canvas, Ln};
use crate::pipeline::fonts::FontFace;
use crate::pipeline::parse::{Block, Section};
use crate::pipeline::sanitize::BULLET;

/// Printed once at the end of every report.
pub const DISCLAIMER: &str = "DISCLAIMER: This report is generated by Artificial Intelligence (AI) and does not constitute a definitive medical diagnosis. Values extracted from images may contain errors. Please verify this report with a certified clinical physician.";

/// Cursor y (mm) past which a section title starts a new page.
pub const SECTION_BREAK_Y: f32 = 250.0;

/// Cursor y (mm) past which a block starts a new page.
pub const BLOCK_BREAK_Y: f32 = 260.0;

/// Line height for body text, mm.
const LINE_H: f32 = 6.0;

/// Horizontal padding added to a chip's title width, mm.
const CHIP_PAD: f32 = 10.0;
const CHIP_H: f32 = 8.0;

/// Left edge of list bullets, mm.
const LIST_INDENT_X: f32 = 15.0;
const BULLET_W: f32 = 5.0;

/// Footer baseline box, from the top edge.
const FOOTER_Y: f32 = 282.0;

/// Lay out `sections` from the current cursor position.
pub fn render_sections(canvas: &mut Canvas, sections: &[Section], theme: &Theme) {
    for section in sections {
        if section.fallback {
            render_fallback(canvas, section, theme);
            continue;
        }

        if canvas.y() > SECTION_BREAK_Y {
            canvas.add_page();
        }
        render_chip(canvas, &section.title, theme);

        for block in &section.blocks {
            if canvas.y() > BLOCK_BREAK_Y {
                canvas.add_page();
            }
            render_block(canvas, block, theme);
        }
    }
}

/// Heading-less content: one full-width run of 11 pt text.
fn render_fallback(canvas: &mut Canvas, section: &Section, theme: &Theme) {
    canvas.set_font(FontFace::Regular, 11.0);
    canvas.set_text_color(theme.text_main);
    for block in &section.blocks {
        match block {
            Block::Paragraph { text } => {
                canvas.multi_cell(0.0, LINE_H, text, Align::Left);
            }
            Block::List { items } => {
                for item in items {
                    canvas.multi_cell(0.0, LINE_H, item, Align::Left);
                }
            }
        }
    }
}

fn render_chip(canvas: &mut Canvas, title: &str, theme: &Theme) {
    canvas.ln(5.0);
    canvas.set_fill_color(theme.accent);
    canvas.set_text_color(theme.chip_text);
    canvas.set_font(FontFace::Bold, 11.0);
    let w = canvas.string_width(title) + CHIP_PAD;
    canvas.cell(w, CHIP_H, title, Ln::NextLine, Align::Center, true);
    canvas.ln(3.0);
}

fn render_block(canvas: &mut Canvas, block: &Block, theme: &Theme) {
    match block {
        Block::Paragraph { text } => {
            canvas.set_font(FontFace::Regular, 10.0);
            canvas.set_text_color(theme.text_main);
            canvas.multi_cell(0.0, LINE_H, text, Align::Left);
            canvas.ln(2.0);
        }
        Block::List { items } => {
            let bullet = BULLET.to_string();
            for item in items {
                canvas.set_x(LIST_INDENT_X);
                canvas.set_text_color(theme.text_main);
                canvas.set_font(FontFace::Regular, 10.0);
                canvas.cell(BULLET_W, LINE_H, &bullet, Ln::Right, Align::Left, false);
                canvas.multi_cell(0.0, LINE_H, item, Align::Left);
            }
            canvas.ln(2.0);
        }
    }
}

/// Rule plus small italic disclaimer, after all content.
pub fn render_disclaimer(canvas: &mut Canvas, theme: &Theme) {
    canvas.ln(10.0);
    canvas.set_draw_color(theme.rule);
    let y = canvas.y();
    canvas.line(10.0, y, 200.0, y);
    canvas.ln(3.0);
    canvas.set_font(FontFace::Italic, 8.0);
    canvas.set_text_color(theme.disclaimer);
    canvas.multi_cell(0.0, 4.0, DISCLAIMER, Align::Center);
}

/// `<brand> | Report #<id> | Page <n>`
pub fn footer_text(brand: &str, report_id: u64, page: usize) -> String {
    format!("{brand} | Report #{report_id} | Page {page}")
}

/// Stamp the footer on every page written so far.
pub fn stamp_footers(canvas: &mut Canvas, brand: &str, report_id: u64, theme: &Theme) {
    for index in 0..canvas.page_count() {
        let text = footer_text(brand, report_id, index + 1);
        canvas.with_page(index, |page| {
            page.set_y(FOOTER_Y);
            page.set_font(FontFace::Italic, 8.0);
            page.set_text_color(theme.footer);
            page.cell(0.0, 10.0, &text, Ln::Right, Align::Center, false);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::canvas::{DrawOp, Page};
    use crate::pipeline::parse::parse_sections;

    fn fresh() -> Canvas {
        let mut c = Canvas::a4();
        c.add_page();
        c
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.texts().collect()
    }

    #[test]
    fn chip_is_filled_and_sized_by_title() {
        let mut c = fresh();
        let sections = parse_sections("<h3>1. OBSERVATION</h3><p>x</p>");
        render_sections(&mut c, &sections, &Theme::default());

        let mut probe = Canvas::a4();
        probe.set_font(FontFace::Bold, 11.0);
        let expected_w = probe.string_width("1. OBSERVATION") + CHIP_PAD;

        let doc = c.finish();
        let rect = doc.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::FillRect { y, w, h, color, .. } => Some((*y, *w, *h, *color)),
                _ => None,
            })
            .unwrap();
        assert_eq!(rect.0, 15.0);
        assert!((rect.1 - expected_w).abs() < 1e-4);
        assert_eq!(rect.2, CHIP_H);
        assert_eq!(rect.3, Theme::default().accent);
    }

    #[test]
    fn list_bullets_are_indented() {
        let mut c = fresh();
        let sections = parse_sections("<h3>T</h3><ul><li>A</li><li>B</li></ul>");
        render_sections(&mut c, &sections, &Theme::default());
        let doc = c.finish();

        let placed: Vec<(f32, &str)> = doc.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, text, .. } => Some((*x, text.as_str())),
                _ => None,
            })
            .collect();
        let bullet = BULLET.to_string();
        assert_eq!(placed[1], (LIST_INDENT_X + 1.0, bullet.as_str()));
        assert_eq!(placed[2], (LIST_INDENT_X + BULLET_W + 1.0, "A"));
        assert_eq!(placed[4].1, "B");
    }

    #[test]
    fn chip_near_bottom_moves_to_next_page() {
        let mut c = fresh();
        c.set_y(251.0);
        render_sections(&mut c, &parse_sections("<h3>Late</h3>"), &Theme::default());
        let doc = c.finish();
        assert_eq!(doc.page_count(), 2);
        assert!(texts(&doc.pages[0]).is_empty());
        assert_eq!(texts(&doc.pages[1]), vec!["Late"]);
    }

    #[test]
    fn block_below_threshold_moves_to_next_page() {
        let mut c = fresh();
        c.set_y(245.0);
        // Chip ends at 245 + 5 + 8 + 3 = 261 > 260.
        render_sections(
            &mut c,
            &parse_sections("<h3>T</h3><p>body</p>"),
            &Theme::default(),
        );
        let doc = c.finish();
        assert_eq!(texts(&doc.pages[0]), vec!["T"]);
        assert_eq!(texts(&doc.pages[1]), vec!["body"]);
    }

    #[test]
    fn long_content_flows_over_pages() {
        let mut c = fresh();
        let body = "<p>".to_string() + &"lorem ipsum dolor sit amet ".repeat(400) + "</p>";
        let raw = format!("<h3>Long</h3>{body}");
        render_sections(&mut c, &parse_sections(&raw), &Theme::default());
        assert!(c.page_count() >= 2);
        let doc = c.finish();
        for page in &doc.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y < 277.0 + 6.0, "text below trigger: {y}");
                }
            }
        }
    }

    #[test]
    fn fallback_uses_eleven_point_text() {
        let mut c = fresh();
        render_sections(&mut c, &parse_sections("just text"), &Theme::default());
        let doc = c.finish();
        match &doc.pages[0].ops[0] {
            DrawOp::Text { size, text, .. } => {
                assert_eq!(*size, 11.0);
                assert_eq!(text, "just text");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn disclaimer_has_rule_and_text() {
        let mut c = fresh();
        render_disclaimer(&mut c, &Theme::default());
        let doc = c.finish();
        assert!(matches!(
            doc.pages[0].ops[0],
            DrawOp::Line { x1, x2, y1, .. } if x1 == 10.0 && x2 == 200.0 && y1 == 20.0
        ));
        let joined = texts(&doc.pages[0]).join(" ");
        assert_eq!(joined, DISCLAIMER);
    }

    #[test]
    fn footers_on_every_page() {
        let mut c = fresh();
        c.add_page();
        c.add_page();
        stamp_footers(&mut c, "JeevPath AI Diagnostics", 42, &Theme::default());
        let doc = c.finish();
        for (i, page) in doc.pages.iter().enumerate() {
            assert_eq!(
                texts(page),
                vec![format!("JeevPath AI Diagnostics | Report #42 | Page {}", i + 1)]
            );
        }
    }
}
