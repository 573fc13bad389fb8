//! `[split]` section configuration.
//!
//! Controls when a script is split into chunks and how its loader is written.
//!
//! # Example
//!
//! ```toml
//! [split]
//! enable = true                # Script optimization master switch
//! large_files = true           # Split scripts above `threshold_kb`
//! critical = false             # Always split the module loader runtime
//! threshold_kb = 100
//! chunks = 5
//! critical_files = ["requirejs/require.js", "requirejs/require.min.js"]
//! chunk_base_url = "https://cdn.jsdelivr.net/gh/user/assets@main/"
//! ```

use std::path::{Path, PathBuf};

use macros::Config;
use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Chunk count used when the configured value is below 2.
pub const DEFAULT_CHUNKS: usize = 5;

/// Script splitting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "split")]
pub struct SplitConfig {
    /// Enable script optimization. Nothing is split when disabled.
    #[config(default = "true")]
    pub enable: bool,

    /// Split scripts larger than `threshold_kb`.
    #[config(default = "true")]
    pub large_files: bool,

    /// Always split critical scripts (see `critical_files`), whatever their size.
    pub critical: bool,

    /// Size threshold in KiB.
    #[config(default = "100")]
    pub threshold_kb: u64,

    /// Number of chunks per split script. Values below 2 fall back to 5.
    #[config(default = "5")]
    pub chunks: usize,

    /// Path suffixes identifying the module loader runtime.
    #[config(default = "[\"requirejs/require.js\", \"requirejs/require.min.js\"]")]
    pub critical_files: Vec<String>,

    /// Public URL prefix written in front of chunk keys inside loaders.
    pub chunk_base_url: String,

    /// Minify generated loader scripts.
    #[config(status = experimental)]
    pub minify_loader: bool,

    /// Parent directory for per-split scratch files (system temp if unset).
    pub temp_dir: Option<PathBuf>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            enable: true,
            large_files: true,
            critical: false,
            threshold_kb: 100,
            chunks: DEFAULT_CHUNKS,
            critical_files: vec![
                "requirejs/require.js".to_string(),
                "requirejs/require.min.js".to_string(),
            ],
            chunk_base_url: String::new(),
            minify_loader: false,
            temp_dir: None,
        }
    }
}

impl SplitConfig {
    /// Threshold in bytes.
    pub const fn threshold_bytes(&self) -> u64 {
        self.threshold_kb.saturating_mul(1024)
    }

    /// Effective chunk count, never below 2.
    pub const fn chunk_count(&self) -> usize {
        if self.chunks < 2 {
            DEFAULT_CHUNKS
        } else {
            self.chunks
        }
    }

    pub fn normalize(&mut self, root: &Path) {
        if let Some(dir) = self.temp_dir.take() {
            self.temp_dir = Some(root.join(dir));
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.critical_files.iter().any(|f| f.trim().is_empty()) {
            diag.error(Self::FIELDS.critical_files, "entries must not be empty");
        }
        if !self.chunk_base_url.is_empty() && !self.chunk_base_url.ends_with('/') {
            diag.error_with_hint(
                Self::FIELDS.chunk_base_url,
                format!("`{}` does not end with `/`", self.chunk_base_url),
                "chunk keys are appended verbatim",
            );
        }
    }
}
