//! `[manifest]` section configuration.
//!
//! ```toml
//! [manifest]
//! path = ".cdnpush/split-manifest.json"
//! ```

use std::path::{Path, PathBuf};

use macros::Config;
use serde::{Deserialize, Serialize};

/// Where the split manifest is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "manifest")]
pub struct ManifestConfig {
    /// JSON file mapping original URLs to their split bundles.
    #[config(default = ".cdnpush/split-manifest.json")]
    pub path: PathBuf,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".cdnpush/split-manifest.json"),
        }
    }
}

impl ManifestConfig {
    pub fn normalize(&mut self, root: &Path) {
        self.path = root.join(&self.path);
    }
}
