//! Asset kind definitions.

use std::path::Path;

use crate::utils::path::extension_lower;

/// Extension of scripts eligible for splitting.
pub const SCRIPT_EXT: &str = "js";

/// Extensions the WebP transcoder can decode.
pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg"];

/// Kind of asset, decided by file extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// JavaScript, may be split into chunks.
    Script,
    /// Raster image, may get a WebP variant.
    Image,
    /// Uploaded as-is.
    Other,
}

impl AssetKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = extension_lower(path);
        if ext == SCRIPT_EXT {
            Self::Script
        } else if IMAGE_EXTS.contains(&ext.as_str()) {
            Self::Image
        } else {
            Self::Other
        }
    }

    #[inline]
    pub const fn is_script(self) -> bool {
        matches!(self, Self::Script)
    }
}
