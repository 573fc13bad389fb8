//! Image variants.
//!
//! # Modules
//!
//! - [`webp`]: lossless WebP transcoding with the `image` crate

mod webp;

use std::path::{Path, PathBuf};

pub use webp::WebpTranscoder;

/// Derives a transcoded sibling of an image asset.
pub trait ImageProcessor: Send + Sync {
    /// Whether the transcoder can decode `path`.
    fn is_image_file(&self, path: &Path) -> bool;

    /// Write a `.webp` variant of `path`, `None` on failure.
    fn convert_to_webp(&self, path: &Path) -> Option<PathBuf>;
}

/// Remote key of a variant: the original key with its extension replaced.
///
/// `catalog/a.png` → `catalog/a.webp`, `logo` → `logo.webp`.
pub fn variant_key(remote_path: &str, ext: &str) -> String {
    let name_start = remote_path.rfind('/').map_or(0, |i| i + 1);
    match remote_path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => format!("{}.{ext}", &remote_path[..name_start + dot]),
        _ => format!("{remote_path}.{ext}"),
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::asset::AssetKind;
    use std::fs;

    /// Writes `<stem>.webp` with fixed bytes, or fails when told to.
    #[derive(Default)]
    pub struct FakeImages {
        pub fail: bool,
    }

    impl ImageProcessor for FakeImages {
        fn is_image_file(&self, path: &Path) -> bool {
            AssetKind::from_path(path) == AssetKind::Image
        }

        fn convert_to_webp(&self, path: &Path) -> Option<PathBuf> {
            if self.fail {
                return None;
            }
            let out = path.with_extension("webp");
            fs::write(&out, b"RIFF-fake-webp").ok()?;
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_key() {
        assert_eq!(variant_key("catalog/product/a.png", "webp"), "catalog/product/a.webp");
        assert_eq!(variant_key("photo.final.jpeg", "webp"), "photo.final.webp");
        assert_eq!(variant_key("v1.2/logo", "webp"), "v1.2/logo.webp");
        assert_eq!(variant_key("img/.hidden", "webp"), "img/.hidden.webp");
    }
}
