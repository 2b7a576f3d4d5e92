//! Decorative header bitmap: a vertical two-colour gradient.
//!
//! The image is generated once and kept on disk under a fixed file name.
//! The header parameters never change at runtime, so the cache has no
//! invalidation: if the file exists it is used as-is. Two requests racing on
//! the very first render both write identical bytes, and the last rename
//! wins, so no lock is taken.

use crate::config::Rgb;
use crate::error::ReportError;
use crate::pipeline::canvas::RasterImage;
use image::{ImageFormat, Rgb as Pixel, RgbImage};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters of the header gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientSpec {
    pub width: u32,
    pub height: u32,
    /// Colour of the top row.
    pub start: Rgb,
    /// Colour approached by the bottom row.
    pub end: Rgb,
}

impl GradientSpec {
    /// The JeevPath header: 210 × 30 px, white fading into mint `#ECFDF5`.
    pub const fn jeevpath() -> Self {
        Self {
            width: 210,
            height: 30,
            start: Rgb(255, 255, 255),
            end: Rgb(236, 253, 245),
        }
    }
}

/// Render the gradient. Row `i` takes
/// `start + (end - start) * i / height` per channel, truncated.
pub fn make_gradient_header(spec: &GradientSpec) -> RgbImage {
    let mut img = RgbImage::new(spec.width, spec.height);
    for i in 0..spec.height {
        let px = Pixel([
            lerp(spec.start.0, spec.end.0, i, spec.height),
            lerp(spec.start.1, spec.end.1, i, spec.height),
            lerp(spec.start.2, spec.end.2, i, spec.height),
        ]);
        for x in 0..spec.width {
            img.put_pixel(x, i, px);
        }
    }
    img
}

fn lerp(start: u8, end: u8, i: u32, height: u32) -> u8 {
    let (s, e) = (start as f64, end as f64);
    (s + (e - s) * i as f64 / height as f64) as u8
}

/// On-disk header cache with a decoded in-memory copy.
///
/// The decoded image is initialised at most once per cache instance; the
/// application keeps one instance for the lifetime of the process (it lives
/// in [`crate::config::ReportConfig`]).
#[derive(Debug)]
pub struct HeaderCache {
    dir: PathBuf,
    spec: GradientSpec,
    decoded: OnceCell<Arc<RasterImage>>,
}

impl HeaderCache {
    /// Fixed file name of the cached header.
    pub const FILE_NAME: &'static str = "jp_gradient_head.png";

    pub fn new(dir: impl Into<PathBuf>, spec: GradientSpec) -> Self {
        Self {
            dir: dir.into(),
            spec,
            decoded: OnceCell::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn spec(&self) -> &GradientSpec {
        &self.spec
    }

    /// Where the header is (or will be) stored.
    pub fn path(&self) -> PathBuf {
        self.dir.join(Self::FILE_NAME)
    }

    /// Return the cached file, generating it first if it does not exist.
    pub fn get_or_create(&self) -> Result<PathBuf, ReportError> {
        let path = self.path();
        if path.exists() {
            debug!("Header image cached at {}", path.display());
            return Ok(path);
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| ReportError::HeaderImage {
            path: path.clone(),
            detail: format!("cannot create cache directory: {e}"),
        })?;

        let img = make_gradient_header(&self.spec);

        // Write beside the target, then rename into place.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| {
            ReportError::HeaderImage {
                path: path.clone(),
                detail: format!("tempfile: {e}"),
            }
        })?;
        img.write_to(tmp.as_file_mut(), ImageFormat::Png)
            .map_err(|e| ReportError::HeaderImage {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        tmp.persist(&path).map_err(|e| ReportError::HeaderImage {
            path: path.clone(),
            detail: e.error.to_string(),
        })?;

        info!(
            "Generated header image {}x{} → {}",
            self.spec.width,
            self.spec.height,
            path.display()
        );
        Ok(path)
    }

    /// Decoded RGB pixels of the header, loaded on first use.
    pub fn load(&self) -> Result<Arc<RasterImage>, ReportError> {
        self.decoded
            .get_or_try_init(|| {
                let path = self.get_or_create()?;
                let rgb = image::open(&path)
                    .map_err(|e| ReportError::HeaderImage {
                        path: path.clone(),
                        detail: e.to_string(),
                    })?
                    .to_rgb8();
                Ok(Arc::new(RasterImage {
                    width: rgb.width(),
                    height: rgb.height(),
                    rgb: rgb.into_raw(),
                }))
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> GradientSpec {
        GradientSpec::jeevpath()
    }

    #[test]
    fn first_row_is_start_colour() {
        let img = make_gradient_header(&spec());
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(209, 0).0, [255, 255, 255]);
    }

    #[test]
    fn last_row_follows_formula() {
        let s = spec();
        let img = make_gradient_header(&s);
        let expected = |a: u8, b: u8| a as f64 + (b as f64 - a as f64) * 29.0 / 30.0;
        let px = img.get_pixel(100, 29).0;
        assert!((px[0] as f64 - expected(255, 236)).abs() <= 1.0);
        assert!((px[1] as f64 - expected(255, 253)).abs() <= 1.0);
        assert!((px[2] as f64 - expected(255, 245)).abs() <= 1.0);
    }

    #[test]
    fn truncates_like_integer_cast() {
        // 255 + (236 - 255) * 29 / 30 = 236.633…
        assert_eq!(lerp(255, 236, 29, 30), 236);
        assert_eq!(lerp(0, 10, 1, 3), 3);
    }

    #[test]
    fn deterministic() {
        assert_eq!(make_gradient_header(&spec()), make_gradient_header(&spec()));
    }

    #[test]
    fn cache_writes_once_and_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HeaderCache::new(dir.path(), spec());
        let path = cache.get_or_create().unwrap();
        assert!(path.ends_with(HeaderCache::FILE_NAME));
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        let again = cache.get_or_create().unwrap();
        assert_eq!(path, again);
        assert_eq!(
            std::fs::metadata(&again).unwrap().modified().unwrap(),
            modified
        );
    }

    #[test]
    fn cache_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HeaderCache::new(dir.path(), spec());
        // A pre-existing header (different colours) is never regenerated.
        let custom = RgbImage::from_pixel(4, 2, Pixel([1, 2, 3]));
        custom.save(cache.path()).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 2));
        assert_eq!(&loaded.rgb[..3], &[1, 2, 3]);
    }

    #[test]
    fn load_decodes_generated_header() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HeaderCache::new(dir.path().join("nested"), spec());
        let img = cache.load().unwrap();
        assert_eq!((img.width, img.height), (210, 30));
        assert_eq!(img.rgb.len(), 210 * 30 * 3);
        assert!(Arc::ptr_eq(&img, &cache.load().unwrap()));
    }
}
