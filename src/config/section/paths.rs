//! `[paths]` section configuration.
//!
//! Maps the two logical URL prefixes to local directories:
//!
//! ```toml
//! [paths]
//! static_prefix = "/static/"
//! static_root = "pub/static"      # relative to the config file
//! media_prefix = "/media/"
//! media_root = "pub/media"
//! ```
//!
//! `/static/frontend/app.js` is then read from `pub/static/frontend/app.js`
//! and published under `frontend/app.js`.

use std::path::{Path, PathBuf};

use macros::Config;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "paths")]
pub struct PathsConfig {
    /// URL prefix of static view files.
    #[config(default = "/static/")]
    pub static_prefix: String,

    /// Local directory served under `static_prefix`.
    #[config(default = "pub/static")]
    pub static_root: PathBuf,

    /// URL prefix of media files.
    #[config(default = "/media/")]
    pub media_prefix: String,

    /// Local directory served under `media_prefix`.
    #[config(default = "pub/media")]
    pub media_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            static_prefix: "/static/".to_string(),
            static_root: PathBuf::from("pub/static"),
            media_prefix: "/media/".to_string(),
            media_root: PathBuf::from("pub/media"),
        }
    }
}

impl PathsConfig {
    /// Resolve both roots against the project root.
    pub fn normalize(&mut self, root: &Path) {
        self.static_root = normalize_path(&root.join(&self.static_root));
        self.media_root = normalize_path(&root.join(&self.media_root));
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_prefix(&self.static_prefix, Self::FIELDS.static_prefix, diag);
        check_prefix(&self.media_prefix, Self::FIELDS.media_prefix, diag);

        if self.static_prefix == self.media_prefix {
            diag.error(
                Self::FIELDS.media_prefix,
                format!("same as static_prefix `{}`", self.static_prefix),
            );
        }
    }
}

fn check_prefix(prefix: &str, field: FieldPath, diag: &mut ConfigDiagnostics) {
    if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
        diag.error_with_hint(
            field,
            format!("invalid url prefix `{prefix}`"),
            "prefixes start and end with `/`, e.g. \"/static/\"",
        );
    }
}
