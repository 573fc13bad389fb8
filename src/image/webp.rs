//! WebP transcoding.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageFormat;

use super::ImageProcessor;
use crate::asset::AssetKind;
use crate::config::WebpConfig;
use crate::utils::path::is_newer_than;
use crate::{debug, log};

/// Writes a lossless `.webp` next to the source image.
#[derive(Debug, Clone, Copy)]
pub struct WebpTranscoder {
    reuse_existing: bool,
}

impl WebpTranscoder {
    pub fn new(config: &WebpConfig) -> Self {
        Self {
            reuse_existing: config.reuse_existing,
        }
    }

    fn transcode(input: &Path, output: &Path) -> Result<()> {
        let img = image::open(input).with_context(|| format!("decode {}", input.display()))?;
        // encoder accepts 8-bit RGB(A) only
        let rgba = image::DynamicImage::ImageRgba8(img.to_rgba8());
        rgba.save_with_format(output, ImageFormat::WebP)
            .with_context(|| format!("encode {}", output.display()))?;
        Ok(())
    }
}

impl ImageProcessor for WebpTranscoder {
    fn is_image_file(&self, path: &Path) -> bool {
        AssetKind::from_path(path) == AssetKind::Image && path.is_file()
    }

    fn convert_to_webp(&self, path: &Path) -> Option<PathBuf> {
        let output = path.with_extension("webp");

        if self.reuse_existing && is_newer_than(&output, path) {
            debug!("webp"; "reusing {}", output.display());
            return Some(output);
        }

        match Self::transcode(path, &output) {
            Ok(()) => {
                debug!("webp"; "converted {}", path.display());
                Some(output)
            }
            Err(e) => {
                log!("webp"; "conversion failed: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    fn transcoder(reuse_existing: bool) -> WebpTranscoder {
        WebpTranscoder::new(&WebpConfig {
            enable: true,
            reuse_existing,
        })
    }

    #[test]
    fn test_convert_png_writes_sibling() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("logo.png");
        RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 255]))
            .save(&png)
            .unwrap();

        let out = transcoder(false).convert_to_webp(&png).unwrap();
        assert_eq!(out, dir.path().join("logo.webp"));
        let bytes = fs::read(&out).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_convert_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("broken.png");
        fs::write(&png, b"not an image").unwrap();
        assert!(transcoder(false).convert_to_webp(&png).is_none());
    }

    #[test]
    fn test_is_image_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("a.jpg");
        fs::write(&jpg, b"x").unwrap();
        let t = transcoder(true);
        assert!(t.is_image_file(&jpg));
        assert!(!t.is_image_file(&dir.path().join("missing.png")));
        assert!(!t.is_image_file(&dir.path().join("a.gif")));
    }
}
