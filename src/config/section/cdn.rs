//! `[cdn]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cdn]
//! enable = true               # Master switch for uploads
//! max_file_size = 10485760    # Largest asset accepted, in bytes (10 MiB)
//! parallel = false            # Process assets of one batch in parallel (not with github)
//! ```

use macros::Config;
use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// General CDN settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "cdn")]
pub struct CdnSectionConfig {
    /// Enable asset uploads. When disabled every batch is rejected up front.
    #[config(default = "true")]
    pub enable: bool,

    /// Largest accepted asset in bytes.
    #[config(default = "10485760")]
    pub max_file_size: u64,

    /// Fan out per-asset work across threads.
    /// Outcomes are still reported in input order.
    /// Ignored by the github store: each upload is a commit on one branch.
    pub parallel: bool,

    /// Silence hints about experimental options.
    pub allow_experimental: bool,
}

impl Default for CdnSectionConfig {
    fn default() -> Self {
        Self {
            enable: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            parallel: false,
            allow_experimental: false,
        }
    }
}

impl CdnSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_file_size == 0 {
            diag.error(Self::FIELDS.max_file_size, "must be greater than 0");
        }
    }
}
