//! Image encoding: report photo → base64 PNG wrapped in `ImageData`.
//!
//! Phone photos of lab reports are often 4000 px or more on the long edge.
//! Each image is decoded, scaled down so neither side exceeds the configured
//! cap, and re-encoded as PNG so fine print survives without JPEG artefacts.

use crate::error::ReportError;
use crate::pipeline::input::ReportImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Decode `img`, cap its size at `max_pixels` per side and encode it for
/// the model request.
pub fn encode_image(img: &ReportImage, max_pixels: u32) -> Result<ImageData, ReportError> {
    let decoded = image::load_from_memory(&img.bytes).map_err(|e| {
        ReportError::InvalidInput(format!("cannot decode image '{}': {e}", img.source))
    })?;
    let scaled = downscale(decoded, max_pixels);
    encode_png(&scaled).map_err(|e| ReportError::Internal(format!("PNG encoding failed: {e}")))
}

fn downscale(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    if img.width() <= max_pixels && img.height() <= max_pixels {
        return img;
    }
    debug!(
        "Downscaling {}x{} to fit {}px",
        img.width(),
        img.height(),
        max_pixels
    );
    img.resize(max_pixels, max_pixels, FilterType::Triangle)
}

/// Encode a decoded image as a base64 PNG ready for the model API.
///
/// `detail: "high"` keeps small print legible for providers that tile images.
pub fn encode_png(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::ImageKind;
    use image::{Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn encode_small_image() {
        let img = ReportImage {
            source: "mem".into(),
            kind: ImageKind::Png,
            bytes: png_bytes(10, 10),
        };
        let data = encode_image(&img, 2000).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(decoded.starts_with(b"\x89PNG"));
    }

    #[test]
    fn large_image_is_downscaled() {
        let big = DynamicImage::ImageRgba8(RgbaImage::new(300, 150));
        let small = downscale(big, 100);
        assert_eq!((small.width(), small.height()), (100, 50));
    }

    #[test]
    fn garbage_is_invalid_input() {
        let img = ReportImage {
            source: "broken.png".into(),
            kind: ImageKind::Png,
            bytes: b"\x89PNG but not really".to_vec(),
        };
        assert!(matches!(
            encode_image(&img, 2000),
            Err(ReportError::InvalidInput(_))
        ));
    }
}
