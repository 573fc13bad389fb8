//! Script splitting.
//!
//! A script above the size threshold (or the module loader runtime, when
//! critical optimization is on) is published as a loader plus `N` chunks:
//!
//! ```text
//! frontend/app.js ──▶ frontend/app_loader.js
//!                     frontend/app_chunk1.js … frontend/app_chunkN.js
//! ```
//!
//! The loader is uploaded first; chunks follow in order. Scratch files live
//! in a per-call temporary directory that is removed on every exit path.

mod classify;
mod dialect;
mod loader;
mod minify;
mod plan;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use thiserror::Error;

use crate::asset::{AssetKind, format_size};
use crate::config::SplitConfig;
use crate::store::{RemoteStore, StoreError};
use crate::{debug, log};

pub use classify::{CriticalClassifier, CriticalFiles};
pub use dialect::{LoaderDialect, has_module_pattern};
pub use plan::SplitPlan;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("cannot read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("script is empty")]
    Empty,

    #[error("cannot write scratch file `{path}`")]
    Scratch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("loader upload to `{key}` failed")]
    LoaderUpload {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("chunk {ordinal} upload to `{key}` failed")]
    ChunkUpload {
        ordinal: usize,
        key: String,
        #[source]
        source: StoreError,
    },
}

/// Remote keys of a published split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub loader: String,
    /// Loader key first, then chunk keys in load order.
    pub chunks: Vec<String>,
}

#[cfg(test)]
impl SplitOutcome {
    /// Number of data chunks, the loader excluded.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len().saturating_sub(1)
    }

    pub fn chunk_keys(&self) -> &[String] {
        self.chunks.get(1..).unwrap_or_default()
    }
}

pub struct Splitter {
    config: SplitConfig,
    store: Arc<dyn RemoteStore>,
    classifier: Arc<dyn CriticalClassifier>,
}

impl Splitter {
    pub fn new(
        config: SplitConfig,
        store: Arc<dyn RemoteStore>,
        classifier: Arc<dyn CriticalClassifier>,
    ) -> Self {
        Self {
            config,
            store,
            classifier,
        }
    }

    /// Whether `path` should be published as a split bundle.
    pub fn should_split(&self, path: &Path) -> bool {
        if !self.config.enable || !AssetKind::from_path(path).is_script() {
            return false;
        }
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }

        if self.config.critical && self.classifier.is_critical(path) {
            log!("split"; "critical script detected: {}", path.display());
            return true;
        }

        if self.config.large_files {
            let size = metadata.len();
            let threshold = self.config.threshold_bytes();
            debug!("split"; "{}: {} bytes (threshold: {} bytes)", path.display(), size, threshold);
            return size > threshold;
        }

        false
    }

    /// Split `local` and publish the loader and chunks next to `remote_path`.
    ///
    /// A failed chunk upload leaves earlier uploads of this call in place.
    pub fn split(&self, local: &Path, remote_path: &str) -> Result<SplitOutcome, SplitError> {
        let content = fs::read(local).map_err(|source| SplitError::Read {
            path: local.to_path_buf(),
            source,
        })?;
        if content.is_empty() {
            return Err(SplitError::Empty);
        }

        let plan = SplitPlan::new(content.len(), self.config.chunk_count(), remote_path);
        log!(
            "split"; "{} ({}) into {} chunks of ~{}",
            remote_path,
            format_size(content.len() as u64),
            plan.chunk_count(),
            format_size(plan.chunk_size() as u64)
        );

        let dialect = LoaderDialect::select(
            self.classifier.is_critical(local),
            has_module_pattern(&content),
        );
        debug!("split"; "loader dialect: {}", dialect.name());

        let scratch = self.scratch_dir()?;
        let loader_key = plan.loader_key();
        let loader_path = scratch.path().join(plan.loader_file());
        write_scratch(&loader_path, self.loader_text(dialect, remote_path, &plan).as_bytes())?;

        self.store
            .upload_file(&loader_path, &loader_key)
            .map_err(|source| SplitError::LoaderUpload {
                key: loader_key.clone(),
                source,
            })?;

        let mut chunks = Vec::with_capacity(plan.chunk_count() + 1);
        chunks.push(loader_key.clone());

        for index in 0..plan.chunk_count() {
            let ordinal = index + 1;
            let chunk_path = scratch.path().join(plan.chunk_file(ordinal));
            write_scratch(&chunk_path, &content[plan.range(index)])?;

            let key = plan.chunk_key(ordinal);
            self.store
                .upload_file(&chunk_path, &key)
                .map_err(|source| SplitError::ChunkUpload {
                    ordinal,
                    key: key.clone(),
                    source,
                })?;
            debug!("split"; "uploaded chunk {}: {}", ordinal, key);
            chunks.push(key);
        }

        log!("split"; "{} published as {} chunks", remote_path, plan.chunk_count());
        Ok(SplitOutcome {
            loader: loader_key,
            chunks,
        })
    }

    fn loader_text(&self, dialect: LoaderDialect, remote_path: &str, plan: &SplitPlan) -> String {
        let urls: Vec<String> = plan
            .chunk_keys()
            .into_iter()
            .map(|key| format!("{}{key}", self.config.chunk_base_url))
            .collect();
        let text = loader::render_loader(dialect, remote_path, &urls);

        if !self.config.minify_loader {
            return text;
        }
        match minify::minify_js(&text) {
            Some(min) => min,
            None => {
                log!("warning"; "loader for {} could not be minified", remote_path);
                text
            }
        }
    }

    fn scratch_dir(&self) -> Result<TempDir, SplitError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("js_split_");
        let parent = self.config.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&parent)
            .and_then(|()| builder.tempdir_in(&parent))
            .map_err(|source| SplitError::Scratch {
                path: parent,
                source,
            })
    }
}

fn write_scratch(path: &Path, bytes: &[u8]) -> Result<(), SplitError> {
    fs::write(path, bytes).map_err(|source| SplitError::Scratch {
        path: path.to_path_buf(),
        source,
    })
}
