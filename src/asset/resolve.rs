//! Logical asset URL → local file + remote key.
//!
//! Pure string work, the filesystem is never touched here:
//!
//! ```text
//! /static/frontend/app.js  → <static_root>/frontend/app.js, key "frontend/app.js"
//! /media/catalog/a.png     → <media_root>/catalog/a.png,    key "catalog/a.png"
//! /unsupported/path.css    → UnsupportedUrlFormat
//! ```

use std::path::{Path, PathBuf};

use super::AssetError;
use crate::config::PathsConfig;

/// Which root an asset was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOrigin {
    Static,
    Media,
}

/// A resolved asset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocation {
    pub origin: AssetOrigin,
    /// Absolute path of the file to publish.
    pub local_path: PathBuf,
    /// Destination key, relative, no leading slash.
    pub remote_path: String,
}

/// Maps URLs under the static and media prefixes to their roots.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    static_prefix: String,
    static_root: PathBuf,
    media_prefix: String,
    media_root: PathBuf,
}

impl AssetResolver {
    pub fn new(config: &PathsConfig) -> Self {
        Self {
            static_prefix: config.static_prefix.clone(),
            static_root: config.static_root.clone(),
            media_prefix: config.media_prefix.clone(),
            media_root: config.media_root.clone(),
        }
    }

    pub fn roots(&self) -> [&Path; 2] {
        [&self.static_root, &self.media_root]
    }

    /// Resolve a logical URL.
    ///
    /// The static prefix is tried first, then the media prefix. A trailing
    /// query string or fragment is ignored. Remainders with empty, `.` or
    /// `..` segments are rejected so no URL can escape its root.
    pub fn resolve(&self, url: &str) -> Result<AssetLocation, AssetError> {
        let unsupported = || AssetError::UnsupportedUrlFormat {
            url: url.to_string(),
        };

        let path = strip_query(url);
        let (origin, root, rest) = if let Some(rest) = path.strip_prefix(&self.static_prefix) {
            (AssetOrigin::Static, &self.static_root, rest)
        } else if let Some(rest) = path.strip_prefix(&self.media_prefix) {
            (AssetOrigin::Media, &self.media_root, rest)
        } else {
            return Err(unsupported());
        };

        if !is_safe_key(rest) {
            return Err(unsupported());
        }

        Ok(AssetLocation {
            origin,
            local_path: root.join(rest),
            remote_path: rest.to_string(),
        })
    }
}

/// Drop `?query` and `#fragment`.
fn strip_query(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |idx| &url[..idx])
}

fn is_safe_key(rest: &str) -> bool {
    !rest.is_empty()
        && !rest.contains('\\')
        && rest
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
