//! Loader dialect selection.

use std::sync::OnceLock;

use regex::bytes::Regex;

/// How the generated loader fetches and runs its chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderDialect {
    /// The module loader runtime itself: fetch all chunks concurrently,
    /// then execute their concatenation as one script.
    SelfLoader,
    /// Content defines or requires modules: load chunks through the
    /// runtime one after another, plain script tags when it is absent.
    ModuleAware,
    /// Sequential `<script>` tags.
    Plain,
}

impl LoaderDialect {
    /// Total over `(is_critical, has_module_pattern)`; criticality wins.
    pub const fn select(is_critical: bool, has_module_pattern: bool) -> Self {
        match (is_critical, has_module_pattern) {
            (true, _) => Self::SelfLoader,
            (false, true) => Self::ModuleAware,
            (false, false) => Self::Plain,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SelfLoader => "self-loader",
            Self::ModuleAware => "module-aware",
            Self::Plain => "plain",
        }
    }
}

/// Whether `content` calls `define(` or `require(` anywhere.
pub fn has_module_pattern(content: &[u8]) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?:define|require)\(").unwrap());
    re.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_total() {
        assert_eq!(LoaderDialect::select(true, true), LoaderDialect::SelfLoader);
        assert_eq!(LoaderDialect::select(true, false), LoaderDialect::SelfLoader);
        assert_eq!(LoaderDialect::select(false, true), LoaderDialect::ModuleAware);
        assert_eq!(LoaderDialect::select(false, false), LoaderDialect::Plain);
    }

    #[test]
    fn test_has_module_pattern() {
        assert!(has_module_pattern(b"define(['jquery'], function ($) {});"));
        assert!(has_module_pattern(b"var x = require('underscore');"));
        assert!(!has_module_pattern(b"function define () {}"));
        assert!(!has_module_pattern(b"console.log('plain');"));
    }
}
