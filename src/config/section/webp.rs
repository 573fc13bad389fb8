//! `[webp]` section configuration.
//!
//! ```toml
//! [webp]
//! enable = false              # Upload a .webp variant next to each image
//! reuse_existing = true       # Skip transcoding when the .webp is newer
//! ```

use macros::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "webp")]
pub struct WebpConfig {
    /// Derive and upload a WebP variant for png/jpeg assets.
    pub enable: bool,

    /// Reuse a sibling `.webp` that is newer than its source image.
    #[config(default = "true")]
    pub reuse_existing: bool,
}

impl Default for WebpConfig {
    fn default() -> Self {
        Self {
            enable: false,
            reuse_existing: true,
        }
    }
}
