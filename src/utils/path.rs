//! Filesystem path helpers.

use std::path::Path;
use std::time::SystemTime;

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first, falling back to the path itself when
/// absolute, or to cwd-joined when relative.
#[inline]
pub fn normalize_path(path: &Path) -> std::path::PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Modification time, `None` when missing or unreadable.
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Check if file A is newer than file B
///
/// `false` if either file doesn't exist or times can't be compared
pub fn is_newer_than(a: &Path, b: &Path) -> bool {
    let (Some(a_time), Some(b_time)) = (get_mtime(a), get_mtime(b)) else {
        return false;
    };
    a_time > b_time
}

/// Lowercased extension of a path, empty when there is none.
pub fn extension_lower(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_is_newer_than() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("a.webp");
        fs::write(&a, "a").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fs::write(&b, "b").unwrap();

        assert!(is_newer_than(&b, &a));
        assert!(!is_newer_than(&a, &b));
        assert!(!is_newer_than(&a, &dir.path().join("missing")));
    }

    #[test]
    fn test_extension_lower() {
        assert_eq!(extension_lower(Path::new("lib/App.JS")), "js");
        assert_eq!(extension_lower(Path::new("Makefile")), "");
    }
}
