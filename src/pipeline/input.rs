//! Input resolution: turn a user-supplied path or URL into image bytes.
//!
//! Report photos arrive either as local files (an upload already written to
//! disk) or as `http(s)` links. Both are read fully into memory; the model
//! request embeds them as base64 anyway. Magic bytes are checked before
//! returning so a PDF or HTML page sent by mistake fails here with a clear
//! error instead of an opaque provider rejection.

use crate::error::ReportError;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

/// Image container formats accepted as report input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Sniff the format from the first bytes of a file.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else {
            None
        }
    }
}

/// A report image loaded into memory.
#[derive(Debug, Clone)]
pub struct ReportImage {
    /// The path or URL it was loaded from.
    pub source: String,
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load one image from a local path or an `http(s)` URL.
pub async fn resolve_image(input: &str, timeout_secs: u64) -> Result<ReportImage, ReportError> {
    if is_url(input) {
        download_image(input, timeout_secs).await
    } else {
        read_local(input)
    }
}

fn magic_of(bytes: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    magic
}

/// Read a local image, validating existence, permissions and magic bytes.
fn read_local(path_str: &str) -> Result<ReportImage, ReportError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ReportError::FileNotFound { path });
    }

    let mut bytes = Vec::new();
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            if let Err(e) = f.read_to_end(&mut bytes) {
                return Err(ReportError::Internal(format!(
                    "reading {}: {e}",
                    path.display()
                )));
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReportError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ReportError::FileNotFound { path });
        }
    }

    let Some(kind) = ImageKind::detect(&bytes) else {
        return Err(ReportError::NotAnImage {
            magic: magic_of(&bytes),
            path,
        });
    };

    debug!("Resolved local image: {} ({:?})", path.display(), kind);
    Ok(ReportImage {
        source: path_str.to_string(),
        kind,
        bytes,
    })
}

/// Download an image URL into memory.
async fn download_image(url: &str, timeout_secs: u64) -> Result<ReportImage, ReportError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReportError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReportError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReportError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReportError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReportError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    let Some(kind) = ImageKind::detect(&bytes) else {
        return Err(ReportError::NotAnImage {
            path: PathBuf::from(url),
            magic: magic_of(&bytes),
        });
    };

    info!("Downloaded {} bytes ({:?})", bytes.len(), kind);
    Ok(ReportImage {
        source: url.to_string(),
        kind,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/xray.png"));
        assert!(is_url("http://example.com/xray.png"));
        assert!(!is_url("/tmp/xray.png"));
        assert!(!is_url("xray.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn detects_png_and_jpeg() {
        assert_eq!(ImageKind::detect(b"\x89PNG\r\n\x1a\n"), Some(ImageKind::Png));
        assert_eq!(ImageKind::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::detect(b"%PDF-1.7"), None);
        assert_eq!(ImageKind::detect(b""), None);
    }

    #[tokio::test]
    async fn missing_file() {
        let err = resolve_image("/definitely/not/here.png", 5).await.unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn rejects_non_image() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.4 not an image").unwrap();
        let err = resolve_image(f.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        match err {
            ReportError::NotAnImage { magic, .. } => assert_eq!(&magic, b"%PDF"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_local_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::RgbImage::from_pixel(3, 3, image::Rgb([9, 9, 9]))
            .save(&path)
            .unwrap();
        let img = resolve_image(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(img.kind, ImageKind::Png);
        assert_eq!(img.source, path.to_str().unwrap());
    }
}
