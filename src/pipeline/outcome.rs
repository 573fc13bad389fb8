//! Per-asset outcomes and the batch result they fold into.

use serde::Serialize;

use crate::asset::AssetError;
use crate::manifest::SplitRecord;

/// Primary result of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    Skipped {
        reason: String,
    },
    Failed(AssetError),
    Uploaded {
        remote_path: String,
    },
    UploadedSplit {
        loader_path: String,
        /// Loader key first, then chunk keys in load order.
        chunk_paths: Vec<String>,
    },
}

impl AssetOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Uploaded { .. } | Self::UploadedSplit { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Skipped { reason } => format!("Skipped: {reason}"),
            Self::Failed(err) => err.to_string(),
            Self::Uploaded { .. } => "Successfully uploaded".to_string(),
            Self::UploadedSplit { chunk_paths, .. } => format!(
                "Successfully uploaded (split into {} chunks)",
                chunk_paths.len().saturating_sub(1)
            ),
        }
    }
}

/// Secondary WebP result, independent of the primary bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WebpOutcome {
    #[default]
    None,
    Converted {
        remote_path: String,
    },
    ConversionFailed(AssetError),
}

/// Outcome of one input URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDetail {
    pub url: String,
    pub outcome: AssetOutcome,
    pub webp: WebpOutcome,
}

impl AssetDetail {
    pub fn new(url: &str, outcome: AssetOutcome) -> Self {
        Self {
            url: url.to_string(),
            outcome,
            webp: WebpOutcome::None,
        }
    }

    pub fn failed(url: &str, err: AssetError) -> Self {
        Self::new(url, AssetOutcome::Failed(err))
    }

    pub fn skipped(url: &str, reason: impl Into<String>) -> Self {
        Self::new(
            url,
            AssetOutcome::Skipped {
                reason: reason.into(),
            },
        )
    }
}

/// Which of the three summary templates applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Success,
    Partial,
    Failure,
}

/// Aggregated result of one batch, appended to in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub webp_converted: usize,
    details: Vec<AssetDetail>,
    split_records: Vec<SplitRecord>,
    /// Batch-level abort reason; no asset was processed.
    pub error: Option<String>,
    /// Set when split records could not be persisted.
    pub manifest_error: Option<String>,
}

impl BatchResult {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// A batch that failed before any asset was looked at.
    pub fn aborted(total: usize, reason: impl Into<String>) -> Self {
        Self {
            total,
            failed: total,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Fold one asset into the counters.
    pub fn record(&mut self, detail: AssetDetail) {
        match &detail.outcome {
            AssetOutcome::Skipped { .. } => self.skipped += 1,
            AssetOutcome::Failed(_) => self.failed += 1,
            AssetOutcome::Uploaded { .. } => self.success += 1,
            AssetOutcome::UploadedSplit {
                loader_path,
                chunk_paths,
            } => {
                self.success += 1;
                self.split_records.push(SplitRecord {
                    original: detail.url.clone(),
                    loader: loader_path.clone(),
                    chunks: chunk_paths.len().saturating_sub(1),
                });
            }
        }
        if matches!(detail.webp, WebpOutcome::Converted { .. }) {
            self.webp_converted += 1;
        }
        self.details.push(detail);
    }

    pub fn details(&self) -> &[AssetDetail] {
        &self.details
    }

    pub fn split_records(&self) -> &[SplitRecord] {
        &self.split_records
    }

    pub fn status(&self) -> BatchStatus {
        if self.error.is_some() {
            return BatchStatus::Failure;
        }
        match (self.success, self.failed) {
            (s, f) if f > 0 && s > 0 => BatchStatus::Partial,
            (0, f) if f > 0 => BatchStatus::Failure,
            _ => BatchStatus::Success,
        }
    }

    pub fn summary(&self) -> String {
        match self.status() {
            BatchStatus::Success => format!(
                "All {} files were successfully uploaded. {} files converted to WebP.",
                self.success, self.webp_converted
            ),
            BatchStatus::Partial => format!(
                "Upload completed with issues: {} successful, {} failed, {} total. {} files converted to WebP.",
                self.success, self.failed, self.total, self.webp_converted
            ),
            BatchStatus::Failure => "Upload failed for all files. Check logs for details.".to_string(),
        }
    }

    /// Serializable view, one row per asset plus one per WebP variant.
    pub fn report(&self) -> BatchReport<'_> {
        let mut details = Vec::with_capacity(self.details.len());
        for detail in &self.details {
            details.push(DetailRow {
                url: detail.url.clone(),
                success: detail.outcome.is_success(),
                message: detail.outcome.message(),
                split_info: match &detail.outcome {
                    AssetOutcome::UploadedSplit {
                        loader_path,
                        chunk_paths,
                    } => Some(SplitInfo {
                        loader: loader_path,
                        chunks: chunk_paths,
                    }),
                    _ => None,
                },
            });

            let webp_row = |success, message| DetailRow {
                url: format!("{} (WebP)", detail.url),
                success,
                message,
                split_info: None,
            };
            match &detail.webp {
                WebpOutcome::None => {}
                WebpOutcome::Converted { .. } => details.push(webp_row(
                    true,
                    "Successfully converted and uploaded WebP version".to_string(),
                )),
                WebpOutcome::ConversionFailed(err) => {
                    details.push(webp_row(false, err.to_string()));
                }
            }
        }

        BatchReport {
            total: self.total,
            success: self.success,
            failed: self.failed,
            webp_converted: self.webp_converted,
            split_js: &self.split_records,
            details,
            message: self.summary(),
            error: self.error.as_deref(),
            manifest_error: self.manifest_error.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub webp_converted: usize,
    pub split_js: &'a [SplitRecord],
    pub details: Vec<DetailRow<'a>>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_error: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct DetailRow<'a> {
    pub url: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_info: Option<SplitInfo<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SplitInfo<'a> {
    pub loader: &'a str,
    pub chunks: &'a [String],
}
