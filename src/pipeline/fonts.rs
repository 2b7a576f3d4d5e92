//! Base-14 Helvetica metrics for string-width measurement.
//!
//! The report never embeds a font: it references the standard Helvetica
//! family every PDF viewer ships, encoded with `WinAnsiEncoding`. Layout
//! still needs advance widths to centre the section chips and wrap lines,
//! so the AFM widths (1/1000 em) for codes 32..=255 are tabulated here.
//! Codes below 32 measure as a space. The oblique face shares the regular
//! metrics.

/// The three faces the report draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
}

impl FontFace {
    /// All faces, in resource-name order (`F1`, `F2`, `F3`).
    pub const ALL: [FontFace; 3] = [FontFace::Regular, FontFace::Bold, FontFace::Italic];

    /// PostScript name of the base-14 font.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
            FontFace::Italic => "Helvetica-Oblique",
        }
    }

    /// Name under which the font is registered in page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
            FontFace::Italic => "F3",
        }
    }

    fn widths(self) -> &'static [u16; 224] {
        match self {
            FontFace::Regular | FontFace::Italic => &HELVETICA,
            FontFace::Bold => &HELVETICA_BOLD,
        }
    }

    /// Advance width of one byte code, in 1/1000 em.
    pub fn glyph_width(self, code: u8) -> u16 {
        if code < 32 {
            return self.widths()[0];
        }
        self.widths()[(code - 32) as usize]
    }
}

/// Width of `text` in 1/1000 em. Characters outside the single-byte range
/// measure as `?`, matching what the sanitiser would have substituted.
pub fn text_units(text: &str, face: FontFace) -> u32 {
    text.chars()
        .map(|c| {
            let code = u8::try_from(c as u32).unwrap_or(b'?');
            face.glyph_width(code) as u32
        })
        .sum()
}

#[rustfmt::skip]
static HELVETICA: [u16; 224] = [
    // 32..=47
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 48..=63
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // 64..=79
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    // 80..=95
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // 96..=111
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    // 112..=127
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 350,
    // 128..=143
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    // 144..=159
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667,
    // 160..=175
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // 176..=191
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 192..=207
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // 208..=223
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 224..=239
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    // 240..=255
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 224] = [
    // 32..=47
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 48..=63
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    // 64..=79
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    // 80..=95
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    // 96..=111
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    // 112..=127
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 350,
    // 128..=143
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    // 144..=159
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,
    // 160..=175
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // 176..=191
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 192..=207
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // 208..=223
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 224..=239
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    // 240..=255
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ascii_widths() {
        assert_eq!(FontFace::Regular.glyph_width(b' '), 278);
        assert_eq!(FontFace::Regular.glyph_width(b'A'), 667);
        assert_eq!(FontFace::Regular.glyph_width(b'i'), 222);
        assert_eq!(FontFace::Bold.glyph_width(b'A'), 722);
        assert_eq!(FontFace::Bold.glyph_width(b'm'), 889);
        assert_eq!(FontFace::Italic.glyph_width(b'W'), 944);
    }

    #[test]
    fn bullet_and_control_codes() {
        assert_eq!(FontFace::Regular.glyph_width(0x95), 350);
        assert_eq!(FontFace::Regular.glyph_width(b'\t'), 278);
    }

    #[test]
    fn text_units_sum_glyphs() {
        // "Hi" = 722 + 222
        assert_eq!(text_units("Hi", FontFace::Regular), 944);
    }

    #[test]
    fn wide_chars_measure_as_placeholder() {
        assert_eq!(
            text_units("\u{2192}", FontFace::Regular),
            text_units("?", FontFace::Regular)
        );
    }
}
