//! Remote content store clients.
//!
//! The pipeline only needs one operation: publish a whole local file under a
//! remote key. Either the file is published at the key or the call fails;
//! there is no partial content and no retry at this layer.
//!
//! | Backend  | Module   | Target                                   |
//! |----------|----------|------------------------------------------|
//! | `github` | `github` | GitHub contents API (one commit per file)|
//! | `local`  | `local`  | Mirror directory on disk                 |

mod github;
mod local;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::config::{StoreConfig, StoreProvider};

pub use github::GithubStore;
pub use local::LocalStore;

/// Errors from a single upload.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("request failed")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {message}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        message: String,
    },

    #[error("invalid remote key `{0}`")]
    InvalidKey(String),
}

/// A remote store that publishes whole files under string keys.
pub trait RemoteStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Whether uploads may run concurrently.
    fn concurrent_uploads(&self) -> bool {
        true
    }

    /// Publish `local` under `key`, replacing any existing blob.
    fn upload_file(&self, local: &Path, key: &str) -> Result<(), StoreError>;
}

/// Build the store selected by `[store] provider`.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn RemoteStore>> {
    Ok(match config.provider {
        StoreProvider::Github => Arc::new(GithubStore::new(&config.github)?),
        StoreProvider::Local => Arc::new(LocalStore::new(config.local.dir.clone())),
    })
}

/// Keys are relative, `/`-separated and free of `.`/`..` segments.
fn check_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|s| !s.is_empty() && s != "." && s != "..");
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// ============================================================================
// Test double
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;

    type FailWhen = Box<dyn Fn(&str) -> bool + Send + Sync>;

    /// In-memory store recording every upload in call order.
    #[derive(Default)]
    pub struct RecordingStore {
        uploads: Mutex<Vec<(String, Vec<u8>)>>,
        fail_when: Option<FailWhen>,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every upload whose key matches `predicate`.
        pub fn failing(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
            Self {
                uploads: Mutex::default(),
                fail_when: Some(Box::new(predicate)),
            }
        }

        pub fn keys(&self) -> Vec<String> {
            self.uploads.lock().iter().map(|(k, _)| k.clone()).collect()
        }

        pub fn content(&self, key: &str) -> Option<Vec<u8>> {
            self.uploads
                .lock()
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, bytes)| bytes.clone())
        }
    }

    impl RemoteStore for RecordingStore {
        fn name(&self) -> &'static str {
            "memory"
        }

        fn upload_file(&self, local: &Path, key: &str) -> Result<(), StoreError> {
            check_key(key)?;
            if self.fail_when.as_ref().is_some_and(|f| f(key)) {
                return Err(StoreError::Status {
                    method: "PUT",
                    url: key.to_string(),
                    status: 500,
                    message: "injected failure".into(),
                });
            }
            let bytes = std::fs::read(local).map_err(|source| StoreError::Read {
                path: local.to_path_buf(),
                source,
            })?;
            self.uploads.lock().push((key.to_string(), bytes));
            Ok(())
        }
    }
}
