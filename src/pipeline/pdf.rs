//! Serialise a laid-out [`Document`] into PDF bytes with `pdf-writer`.
//!
//! Fonts are the three base-14 Helvetica faces with `WinAnsiEncoding`, so
//! every text run must be single-byte; [`encode_text`] enforces that and
//! turns the first offending character into [`ReportError::Encoding`].
//! Content streams and image data are Flate-compressed.

use crate::config::Rgb;
use crate::error::ReportError;
use crate::pipeline::canvas::{DrawOp, Document, PT_PER_MM};
use crate::pipeline::fonts::FontFace;
use crate::pipeline::sanitize::is_encodable;
use miniz_oxide::deflate::compress_to_vec_zlib;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::debug;

const COMPRESSION_LEVEL: u8 = 6;

/// Encode `text` one byte per character. `context` names the string in the
/// error message.
pub fn encode_text(text: &str, context: &str) -> Result<Vec<u8>, ReportError> {
    text.chars()
        .map(|ch| {
            if is_encodable(ch) {
                Ok(ch as u32 as u8)
            } else {
                Err(ReportError::Encoding {
                    context: context.to_string(),
                    ch,
                    code: ch as u32,
                })
            }
        })
        .collect()
}

/// Monotonic object-id allocator.
struct Refs(i32);

impl Refs {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

/// Write `doc` as a complete PDF file. `title` goes into the document info.
pub fn write_pdf(doc: &Document, title: &str) -> Result<Vec<u8>, ReportError> {
    let mut pdf = Pdf::new();
    let mut refs = Refs(0);

    let catalog_id = refs.next();
    let page_tree_id = refs.next();
    let info_id = refs.next();

    let font_ids: Vec<(FontFace, Ref)> = FontFace::ALL.iter().map(|f| (*f, refs.next())).collect();
    for (face, id) in &font_ids {
        pdf.type1_font(*id)
            .base_font(Name(face.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let mut image_ids = Vec::with_capacity(doc.images.len());
    for image in &doc.images {
        let id = refs.next();
        let data = compress_to_vec_zlib(&image.rgb, COMPRESSION_LEVEL);
        let mut xobject = pdf.image_xobject(id, &data);
        xobject.filter(Filter::FlateDecode);
        xobject.width(image.width as i32);
        xobject.height(image.height as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();
        image_ids.push(id);
    }

    let page_ids: Vec<Ref> = doc.pages.iter().map(|_| refs.next()).collect();
    let content_ids: Vec<Ref> = doc.pages.iter().map(|_| refs.next()).collect();

    for (index, page) in doc.pages.iter().enumerate() {
        let mut content = Content::new();
        for op in &page.ops {
            draw(&mut content, op, doc.height)?;
        }
        let raw = content.finish();
        let compressed = compress_to_vec_zlib(&raw, COMPRESSION_LEVEL);
        pdf.stream(content_ids[index], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    let image_names: Vec<String> = (0..image_ids.len()).map(image_name).collect();
    for (index, page_id) in page_ids.iter().enumerate() {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(
            0.0,
            0.0,
            doc.width * PT_PER_MM,
            doc.height * PT_PER_MM,
        ))
        .parent(page_tree_id)
        .contents(content_ids[index]);

        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (face, id) in &font_ids {
                fonts.pair(Name(face.resource_name().as_bytes()), *id);
            }
        }
        if !image_ids.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, id) in image_names.iter().zip(&image_ids) {
                xobjects.pair(Name(name.as_bytes()), *id);
            }
        }
    }

    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr(concat!("jeevpath-report ", env!("CARGO_PKG_VERSION"))));

    let bytes = pdf.finish();
    debug!(
        "Serialized {} page(s), {} image(s), {} bytes",
        doc.pages.len(),
        doc.images.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Append one op to a page content stream. Canvas millimetres from the top
/// become PDF points from the bottom.
fn draw(content: &mut Content, op: &DrawOp, page_h: f32) -> Result<(), ReportError> {
    let k = PT_PER_MM;
    match op {
        DrawOp::Text {
            x,
            y,
            face,
            size,
            color,
            text,
        } => {
            let bytes = encode_text(text, "page text")?;
            set_fill(content, *color);
            content
                .begin_text()
                .set_font(Name(face.resource_name().as_bytes()), *size)
                .next_line(x * k, (page_h - y) * k)
                .show(Str(&bytes))
                .end_text();
        }
        DrawOp::FillRect { x, y, w, h, color } => {
            set_fill(content, *color);
            content.rect(x * k, (page_h - y - h) * k, w * k, h * k);
            content.fill_nonzero();
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        } => {
            let [r, g, b] = color.to_unit();
            content.set_stroke_rgb(r, g, b);
            content.set_line_width(width * k);
            content.move_to(x1 * k, (page_h - y1) * k);
            content.line_to(x2 * k, (page_h - y2) * k);
            content.stroke();
        }
        DrawOp::Image { image, x, y, w, h } => {
            let name = image_name(*image);
            content.save_state();
            content.transform([w * k, 0.0, 0.0, h * k, x * k, (page_h - y - h) * k]);
            content.x_object(Name(name.as_bytes()));
            content.restore_state();
        }
    }
    Ok(())
}

fn set_fill(content: &mut Content, color: Rgb) {
    let [r, g, b] = color.to_unit();
    content.set_fill_rgb(r, g, b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::canvas::{Align, Canvas, Ln, RasterImage};
    use std::sync::Arc;

    #[test]
    fn encode_latin1() {
        assert_eq!(encode_text("A\u{00E9}\u{0095}", "t").unwrap(), vec![b'A', 0xE9, 0x95]);
    }

    #[test]
    fn encode_rejects_wide_chars() {
        let err = encode_text("ok \u{2192}", "brand title").unwrap_err();
        match err {
            ReportError::Encoding { ch, code, context } => {
                assert_eq!(ch, '\u{2192}');
                assert_eq!(code, 0x2192);
                assert_eq!(context, "brand title");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    fn sample_doc() -> Document {
        let mut c = Canvas::a4();
        c.add_page();
        c.image(
            Arc::new(RasterImage {
                width: 2,
                height: 1,
                rgb: vec![255, 255, 255, 0, 0, 0],
            }),
            0.0,
            0.0,
            210.0,
            30.0,
        );
        c.cell(0.0, 10.0, "Hello", Ln::NextLine, Align::Left, true);
        c.line(10.0, 50.0, 200.0, 50.0);
        c.add_page();
        c.cell(0.0, 10.0, "Second", Ln::NextLine, Align::Center, false);
        c.finish()
    }

    #[test]
    fn writes_pdf_header_and_trailer() {
        let bytes = write_pdf(&sample_doc(), "Test").unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let tail = String::from_utf8_lossy(&bytes[bytes.len().saturating_sub(64)..]).to_string();
        assert!(tail.contains("%%EOF"));
    }

    #[test]
    fn declares_pages_fonts_and_image() {
        let bytes = write_pdf(&sample_doc(), "Test").unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("/Helvetica-Oblique"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("/Im1"));
        assert!(text.contains("/FlateDecode"));
    }

    #[test]
    fn non_latin1_text_fails() {
        let mut c = Canvas::a4();
        c.add_page();
        c.cell(0.0, 10.0, "\u{0939}", Ln::NextLine, Align::Left, false);
        let err = write_pdf(&c.finish(), "Test").unwrap_err();
        assert!(matches!(err, ReportError::Encoding { .. }));
    }
}
