//! Cursor-based page canvas.
//!
//! Layout works top-down in millimetres with the origin at the top-left
//! corner of an A4 page, the way a printed form is measured. The canvas
//! keeps a write cursor (`x`, `y`), the current font and colours, and
//! records every drawing call as a [`DrawOp`] on the current [`Page`].
//! Nothing is encoded here: [`crate::pipeline::pdf`] turns the finished
//! [`Document`] into bytes afterwards, which keeps layout testable without
//! parsing PDF output.
//!
//! Text placement follows the classic cell model:
//!
//! * [`Canvas::cell`] draws one line inside a `w × h` box and moves the
//!   cursor right, below, or to the start of the next line.
//! * [`Canvas::multi_cell`] word-wraps text into a column of cells.
//! * When a cell would cross the page-break trigger (page height minus the
//!   bottom margin) a new page is started and the cell lands at the top.

use crate::config::Rgb;
use crate::pipeline::fonts::{text_units, FontFace};
use std::sync::Arc;

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// A4 portrait, in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Decoded 8-bit RGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// One recorded drawing call. Coordinates are millimetres from the
/// top-left corner; `Text::y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        face: FontFace,
        size: f32,
        color: Rgb,
        text: String,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    Image {
        /// Index into [`Document::images`].
        image: usize,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text drawn on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A finished, unencoded document.
#[derive(Debug, Clone)]
pub struct Document {
    pub width: f32,
    pub height: f32,
    pub pages: Vec<Page>,
    pub images: Vec<Arc<RasterImage>>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Horizontal placement of text inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Where the cursor goes after a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ln {
    /// To the right of the cell.
    Right,
    /// To the left margin of the next line.
    NextLine,
    /// Directly below the cell.
    Below,
}

/// The page-writing cursor.
#[derive(Debug)]
pub struct Canvas {
    doc: Document,
    current: usize,
    x: f32,
    y: f32,
    left_margin: f32,
    top_margin: f32,
    right_margin: f32,
    bottom_margin: f32,
    /// Inner padding applied to left-aligned cell text.
    cell_margin: f32,
    auto_page_break: bool,
    face: FontFace,
    size_pt: f32,
    text_color: Rgb,
    fill_color: Rgb,
    draw_color: Rgb,
    line_width: f32,
}

impl Canvas {
    /// An empty A4 canvas with 10 mm margins and a 20 mm break margin.
    pub fn a4() -> Self {
        Self::new(A4_WIDTH_MM, A4_HEIGHT_MM)
    }

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            doc: Document {
                width,
                height,
                pages: Vec::new(),
                images: Vec::new(),
            },
            current: 0,
            x: 10.0,
            y: 10.0,
            left_margin: 10.0,
            top_margin: 10.0,
            right_margin: 10.0,
            bottom_margin: 20.0,
            cell_margin: 1.0,
            auto_page_break: true,
            face: FontFace::Regular,
            size_pt: 12.0,
            text_color: Rgb::BLACK,
            fill_color: Rgb::BLACK,
            draw_color: Rgb::BLACK,
            line_width: 0.2,
        }
    }

    // ── Pages ────────────────────────────────────────────────────────────

    /// Start a new page and put the cursor at the top-left margin.
    pub fn add_page(&mut self) {
        self.doc.pages.push(Page::default());
        self.current = self.doc.pages.len() - 1;
        self.x = self.left_margin;
        self.y = self.top_margin;
    }

    pub fn page_count(&self) -> usize {
        self.doc.pages.len()
    }

    pub fn set_auto_page_break(&mut self, enabled: bool, margin: f32) {
        self.auto_page_break = enabled;
        self.bottom_margin = margin;
    }

    /// Y position past which a cell triggers a page break.
    pub fn page_break_trigger(&self) -> f32 {
        self.doc.height - self.bottom_margin
    }

    /// Run `f` against an already written page without moving the cursor
    /// of the main flow and without breaking pages. Used for footers.
    pub fn with_page(&mut self, index: usize, f: impl FnOnce(&mut Canvas)) {
        if index >= self.doc.pages.len() {
            return;
        }
        let saved = (
            self.current,
            self.x,
            self.y,
            self.auto_page_break,
            self.face,
            self.size_pt,
            self.text_color,
        );
        self.current = index;
        self.auto_page_break = false;
        f(self);
        (
            self.current,
            self.x,
            self.y,
            self.auto_page_break,
            self.face,
            self.size_pt,
            self.text_color,
        ) = saved;
    }

    pub fn finish(self) -> Document {
        self.doc
    }

    // ── Cursor ───────────────────────────────────────────────────────────

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = if x >= 0.0 { x } else { self.doc.width + x };
    }

    /// Move vertically and return to the left margin. Negative values count
    /// from the bottom edge.
    pub fn set_y(&mut self, y: f32) {
        self.x = self.left_margin;
        self.y = if y >= 0.0 { y } else { self.doc.height + y };
    }

    pub fn set_xy(&mut self, x: f32, y: f32) {
        self.set_y(y);
        self.set_x(x);
    }

    /// Line feed: back to the left margin and down by `h`.
    pub fn ln(&mut self, h: f32) {
        self.x = self.left_margin;
        self.y += h;
    }

    // ── Style ────────────────────────────────────────────────────────────

    pub fn set_font(&mut self, face: FontFace, size_pt: f32) {
        self.face = face;
        self.size_pt = size_pt;
    }

    pub fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    pub fn set_fill_color(&mut self, color: Rgb) {
        self.fill_color = color;
    }

    pub fn set_draw_color(&mut self, color: Rgb) {
        self.draw_color = color;
    }

    /// Current font size in millimetres.
    pub fn font_size(&self) -> f32 {
        self.size_pt / PT_PER_MM
    }

    /// Width of `text` in the current font, in millimetres.
    pub fn string_width(&self, text: &str) -> f32 {
        text_units(text, self.face) as f32 * self.font_size() / 1000.0
    }

    // ── Drawing ──────────────────────────────────────────────────────────

    fn push(&mut self, op: DrawOp) {
        if self.doc.pages.is_empty() {
            self.add_page();
        }
        self.doc.pages[self.current].ops.push(op);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let color = self.fill_color;
        self.push(DrawOp::FillRect { x, y, w, h, color });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let (width, color) = (self.line_width, self.draw_color);
        self.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        });
    }

    /// Place `image` into the given box, registering it on first use.
    pub fn image(&mut self, image: Arc<RasterImage>, x: f32, y: f32, w: f32, h: f32) {
        let index = match self
            .doc
            .images
            .iter()
            .position(|known| Arc::ptr_eq(known, &image))
        {
            Some(i) => i,
            None => {
                self.doc.images.push(image);
                self.doc.images.len() - 1
            }
        };
        self.push(DrawOp::Image {
            image: index,
            x,
            y,
            w,
            h,
        });
    }

    /// One line of text in a `w × h` box. `w == 0` extends the box to the
    /// right margin.
    pub fn cell(&mut self, w: f32, h: f32, text: &str, ln: Ln, align: Align, fill: bool) {
        if self.auto_page_break && self.y + h > self.page_break_trigger() {
            let x = self.x;
            self.add_page();
            self.x = x;
        }

        let w = if w == 0.0 {
            self.doc.width - self.right_margin - self.x
        } else {
            w
        };

        if fill {
            self.fill_rect(self.x, self.y, w, h);
        }

        if !text.is_empty() {
            let dx = match align {
                Align::Center => (w - self.string_width(text)) / 2.0,
                Align::Left => self.cell_margin,
            };
            let op = DrawOp::Text {
                x: self.x + dx,
                y: self.y + 0.5 * h + 0.3 * self.font_size(),
                face: self.face,
                size: self.size_pt,
                color: self.text_color,
                text: text.to_string(),
            };
            self.push(op);
        }

        match ln {
            Ln::Right => self.x += w,
            Ln::NextLine => {
                self.y += h;
                self.x = self.left_margin;
            }
            Ln::Below => self.y += h,
        }
    }

    /// Word-wrapped text in a column `w` wide (`0` = to the right margin),
    /// one cell of height `h` per line. Lines break at the last space that
    /// fits; a word longer than the column is split mid-word. Explicit
    /// `\n` starts a new line. Returns the number of lines written.
    pub fn multi_cell(&mut self, w: f32, h: f32, text: &str, align: Align) -> usize {
        let w = if w == 0.0 {
            self.doc.width - self.right_margin - self.x
        } else {
            w
        };
        let wmax = (w - 2.0 * self.cell_margin) * 1000.0 / self.font_size();

        let chars: Vec<char> = text.chars().filter(|&c| c != '\r').collect();
        let mut nb = chars.len();
        if nb > 0 && chars[nb - 1] == '\n' {
            nb -= 1;
        }

        let line = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };

        let mut lines = 0;
        let mut sep: Option<usize> = None;
        let (mut i, mut j) = (0usize, 0usize);
        let mut l = 0.0f32;
        while i < nb {
            let c = chars[i];
            if c == '\n' {
                self.cell(w, h, &line(j, i), Ln::Below, align, false);
                lines += 1;
                i += 1;
                sep = None;
                j = i;
                l = 0.0;
                continue;
            }
            if c == ' ' {
                sep = Some(i);
            }
            l += text_units(&c.to_string(), self.face) as f32;
            if l > wmax {
                match sep {
                    None => {
                        if i == j {
                            i += 1;
                        }
                        self.cell(w, h, &line(j, i), Ln::Below, align, false);
                    }
                    Some(s) => {
                        self.cell(w, h, &line(j, s), Ln::Below, align, false);
                        i = s + 1;
                    }
                }
                lines += 1;
                sep = None;
                j = i;
                l = 0.0;
            } else {
                i += 1;
            }
        }
        self.cell(w, h, &line(j, i), Ln::Below, align, false);
        lines += 1;
        self.x = self.left_margin;
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        let mut c = Canvas::a4();
        c.add_page();
        c.set_font(FontFace::Regular, 10.0);
        c
    }

    #[test]
    fn cell_next_line_returns_to_margin() {
        let mut c = canvas();
        c.set_x(40.0);
        c.cell(20.0, 6.0, "Hi", Ln::NextLine, Align::Left, false);
        assert_eq!(c.x(), 10.0);
        assert_eq!(c.y(), 16.0);
    }

    #[test]
    fn cell_right_advances_x() {
        let mut c = canvas();
        c.cell(30.0, 5.0, "Label", Ln::Right, Align::Left, false);
        assert_eq!(c.x(), 40.0);
        assert_eq!(c.y(), 10.0);
    }

    #[test]
    fn centred_text_is_centred() {
        let mut c = canvas();
        c.cell(100.0, 8.0, "Title", Ln::Right, Align::Center, false);
        let w = c.string_width("Title");
        let doc = c.finish();
        match &doc.pages[0].ops[0] {
            DrawOp::Text { x, .. } => assert!((x - (10.0 + (100.0 - w) / 2.0)).abs() < 1e-4),
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn filled_cell_records_rect_first() {
        let mut c = canvas();
        c.set_fill_color(Rgb(16, 185, 129));
        c.cell(50.0, 8.0, "X", Ln::NextLine, Align::Center, true);
        let doc = c.finish();
        assert!(matches!(
            doc.pages[0].ops[0],
            DrawOp::FillRect { w, h, color: Rgb(16, 185, 129), .. } if w == 50.0 && h == 8.0
        ));
    }

    #[test]
    fn multi_cell_wraps_on_spaces() {
        let mut c = canvas();
        let text = "word ".repeat(80);
        let lines = c.multi_cell(0.0, 6.0, text.trim_end(), Align::Left);
        assert!(lines > 1);
        let doc = c.finish();
        for t in doc.pages[0].texts() {
            assert!(!t.starts_with(' '), "line starts with space: {t:?}");
            assert!(c_width(t) <= 190.0 - 2.0 + 1e-3);
        }
    }

    fn c_width(t: &str) -> f32 {
        text_units(t, FontFace::Regular) as f32 * (10.0 / PT_PER_MM) / 1000.0
    }

    #[test]
    fn multi_cell_splits_long_word() {
        let mut c = canvas();
        let word = "x".repeat(500);
        let lines = c.multi_cell(0.0, 6.0, &word, Align::Left);
        assert!(lines >= 2);
        let doc = c.finish();
        let joined: String = doc.pages[0].texts().collect();
        assert_eq!(joined, word);
    }

    #[test]
    fn multi_cell_empty_text_takes_one_line() {
        let mut c = canvas();
        let before = c.y();
        assert_eq!(c.multi_cell(0.0, 6.0, "", Align::Left), 1);
        assert_eq!(c.y(), before + 6.0);
        assert_eq!(c.finish().pages[0].ops.len(), 0);
    }

    #[test]
    fn multi_cell_honours_newlines() {
        let mut c = canvas();
        assert_eq!(c.multi_cell(0.0, 6.0, "a\nb\n", Align::Left), 2);
    }

    #[test]
    fn multi_cell_keeps_indent_and_resets_x() {
        let mut c = canvas();
        c.set_x(20.0);
        c.multi_cell(0.0, 6.0, &"indent ".repeat(60), Align::Left);
        assert_eq!(c.x(), 10.0);
        let doc = c.finish();
        for op in &doc.pages[0].ops {
            if let DrawOp::Text { x, .. } = op {
                assert!((x - 21.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn auto_page_break_moves_cell_to_new_page() {
        let mut c = canvas();
        c.set_y(274.0);
        c.cell(0.0, 6.0, "overflow", Ln::NextLine, Align::Left, false);
        assert_eq!(c.page_count(), 2);
        assert_eq!(c.y(), 16.0);
        let doc = c.finish();
        assert_eq!(doc.pages[1].texts().collect::<Vec<_>>(), vec!["overflow"]);
    }

    #[test]
    fn with_page_restores_flow() {
        let mut c = canvas();
        c.add_page();
        c.set_y(100.0);
        c.with_page(0, |p| {
            p.set_y(-15.0);
            p.cell(0.0, 10.0, "footer", Ln::Right, Align::Center, false);
        });
        assert_eq!(c.y(), 100.0);
        c.cell(0.0, 5.0, "flow", Ln::NextLine, Align::Left, false);
        let doc = c.finish();
        assert_eq!(doc.pages[0].texts().collect::<Vec<_>>(), vec!["footer"]);
        assert_eq!(doc.pages[1].texts().collect::<Vec<_>>(), vec!["flow"]);
    }

    #[test]
    fn image_registered_once() {
        let mut c = canvas();
        let img = Arc::new(RasterImage {
            width: 1,
            height: 1,
            rgb: vec![0, 0, 0],
        });
        c.image(img.clone(), 0.0, 0.0, 10.0, 10.0);
        c.image(img, 0.0, 20.0, 10.0, 10.0);
        assert_eq!(c.finish().images.len(), 1);
    }
}
