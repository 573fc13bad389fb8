//! Per-asset error taxonomy.
//!
//! Every variant is local to one asset: it is recorded as that asset's
//! outcome and never aborts the batch. `Display` is the detail message shown
//! to the user.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single asset could not be published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Unsupported URL format: {url}")]
    UnsupportedUrlFormat { url: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("File too large: {path} ({}, max size: {})", size_label(.size), size_label(.max))]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("File is empty: {path}")]
    FileEmpty { path: PathBuf },

    #[error("Failed to upload `{key}`: {reason}")]
    UploadFailed { key: String, reason: String },

    #[error("Failed to split script: {reason}")]
    SplitFailed { reason: String },

    #[error("Failed to convert `{path}` to WebP")]
    VariantConversionFailed { path: PathBuf },

    #[error("{message}")]
    Unexpected { message: String },
}

impl AssetError {
    /// Stable identifier, used in logs.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedUrlFormat { .. } => "unsupported_url_format",
            Self::FileNotFound { .. } => "file_not_found",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::FileEmpty { .. } => "file_empty",
            Self::UploadFailed { .. } => "upload_failed",
            Self::SplitFailed { .. } => "split_failed",
            Self::VariantConversionFailed { .. } => "variant_conversion_failed",
            Self::Unexpected { .. } => "unexpected",
        }
    }
}

fn size_label(bytes: &u64) -> String {
    format_size(*bytes)
}

/// Human readable byte size: `512 B`, `100 KiB`, `10 MiB`.
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
