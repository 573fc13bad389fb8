//! Split manifest: which original URLs are currently served as split bundles.
//!
//! Persisted as a JSON array at `manifest.path`:
//!
//! ```json
//! [{"original": "/static/app.js", "loader": "app_loader.js", "chunks": 5}]
//! ```
//!
//! At most one record exists per original URL. Merging replaces a record
//! with the same `original` and appends the rest; the whole list is written
//! back, never diffed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{debug, log};

/// One split bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRecord {
    /// Logical URL that was split.
    pub original: String,
    /// Remote key of the loader.
    pub loader: String,
    /// Number of data chunks.
    pub chunks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitManifest {
    records: Vec<SplitRecord>,
}

impl SplitManifest {
    #[cfg(test)]
    pub fn new(records: Vec<SplitRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SplitRecord] {
        &self.records
    }

    #[cfg(test)]
    pub fn get(&self, original: &str) -> Option<&SplitRecord> {
        self.records.iter().find(|r| r.original == original)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Last-write-wins merge keyed by `original`.
pub fn merge(mut existing: SplitManifest, incoming: &[SplitRecord]) -> SplitManifest {
    let mut index: FxHashMap<String, usize> = existing
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.original.clone(), i))
        .collect();

    for record in incoming {
        match index.get(&record.original) {
            Some(&i) => existing.records[i] = record.clone(),
            None => {
                index.insert(record.original.clone(), existing.records.len());
                existing.records.push(record.clone());
            }
        }
    }
    existing
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write manifest `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode manifest")]
    Encode(#[from] serde_json::Error),
}

/// Persistence for the split manifest.
pub trait ManifestStore: Send + Sync {
    fn load(&self) -> Result<SplitManifest, ManifestError>;

    /// Merge `incoming` into the stored manifest and persist the result.
    fn update(&self, incoming: &[SplitRecord]) -> Result<SplitManifest, ManifestError>;
}

/// JSON file store; read-modify-write is serialized by a lock.
pub struct ManifestFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ManifestFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SplitManifest, ManifestError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SplitManifest::default()),
            Err(source) => {
                return Err(ManifestError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if json.trim().is_empty() {
            return Ok(SplitManifest::default());
        }
        match serde_json::from_str(&json) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                log!("manifest"; "error decoding {}: {}, starting empty", self.path.display(), e);
                Ok(SplitManifest::default())
            }
        }
    }

    fn write(&self, manifest: &SplitManifest) -> Result<(), ManifestError> {
        let write_err = |source| ManifestError::Write {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_string_pretty(manifest)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl ManifestStore for ManifestFile {
    fn load(&self) -> Result<SplitManifest, ManifestError> {
        let _guard = self.lock.lock();
        self.read()
    }

    fn update(&self, incoming: &[SplitRecord]) -> Result<SplitManifest, ManifestError> {
        let _guard = self.lock.lock();
        let merged = merge(self.read()?, incoming);
        self.write(&merged)?;
        debug!("manifest"; "saved {} records to {}", merged.len(), self.path.display());
        Ok(merged)
    }
}
