//! Critical script detection.

use std::path::Path;

/// Decides whether a script is the module loader runtime itself.
pub trait CriticalClassifier: Send + Sync {
    fn is_critical(&self, path: &Path) -> bool;
}

/// Matches `/`-separated path suffixes from `split.critical_files`.
#[derive(Debug, Clone, Default)]
pub struct CriticalFiles {
    suffixes: Vec<String>,
}

impl CriticalFiles {
    pub fn new(suffixes: &[String]) -> Self {
        Self {
            suffixes: suffixes
                .iter()
                .map(|s| s.trim().trim_start_matches('/').replace('\\', "/"))
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl CriticalClassifier for CriticalFiles {
    fn is_critical(&self, path: &Path) -> bool {
        let path = path.to_string_lossy().replace('\\', "/");
        self.suffixes.iter().any(|suffix| {
            path.strip_suffix(suffix.as_str())
                .is_some_and(|head| head.is_empty() || head.ends_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CriticalFiles {
        CriticalFiles::new(&["requirejs/require.js".into(), "/requirejs/require.min.js".into()])
    }

    #[test]
    fn test_matches_whole_segments() {
        let c = classifier();
        assert!(c.is_critical(Path::new(
            "/srv/pub/static/frontend/Luma/en_US/requirejs/require.js"
        )));
        assert!(c.is_critical(Path::new("requirejs/require.min.js")));
        assert!(!c.is_critical(Path::new("/srv/pub/static/myrequirejs/require.js")));
        assert!(!c.is_critical(Path::new("/srv/pub/static/requirejs/require.json")));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let c = CriticalFiles::new(&["  ".into()]);
        assert!(!c.is_critical(Path::new("requirejs/require.js")));
    }
}
