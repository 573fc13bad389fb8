//! Mirror directory store.

use std::fs;
use std::path::{Path, PathBuf};

use super::{RemoteStore, StoreError, check_key};

/// Publishes files by copying them under `dir`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl RemoteStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn upload_file(&self, local: &Path, key: &str) -> Result<(), StoreError> {
        check_key(key)?;
        let target = self.dir.join(key);
        let write_err = |source| StoreError::Write {
            path: target.clone(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        if !local.is_file() {
            return Err(StoreError::Read {
                path: local.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a file"),
            });
        }
        fs::copy(local, &target).map_err(write_err)?;
        Ok(())
    }
}
