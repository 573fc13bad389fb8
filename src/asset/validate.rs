//! Pre-upload checks on the local file.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use super::AssetError;
use crate::{debug, log};

/// Checks existence and size bounds before any processing.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_file_size: u64,
}

impl Validator {
    pub const fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Validate a local asset, returning its size in bytes.
    ///
    /// Checks short-circuit in order: exists, `size <= max`, `size > 0`.
    pub fn validate(&self, path: &Path) -> Result<u64, AssetError> {
        let metadata = match fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            _ => {
                log!("error"; "file not found: {}", path.display());
                return Err(AssetError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        };

        let size = metadata.len();
        debug!("upload"; "file size: {} bytes", size);

        if size > self.max_file_size {
            log!("warning"; "file too large: {} ({} bytes)", path.display(), size);
            return Err(AssetError::FileTooLarge {
                path: path.to_path_buf(),
                size,
                max: self.max_file_size,
            });
        }

        if size == 0 {
            log!("warning"; "file is empty: {}", path.display());
            return Err(AssetError::FileEmpty {
                path: path.to_path_buf(),
            });
        }

        probe_content(path, size);
        Ok(size)
    }
}

/// Best-effort read for diagnostics only; never fails validation.
fn probe_content(path: &Path, size: u64) {
    let mut buf = [0u8; 1];
    match File::open(path).and_then(|mut f| f.read(&mut buf)) {
        Ok(0) if size > 0 => {
            log!("warning"; "content of {} is empty despite non-zero size", path.display());
        }
        Ok(_) => {}
        Err(e) => debug!("upload"; "could not read {}: {}", path.display(), e),
    }
}
