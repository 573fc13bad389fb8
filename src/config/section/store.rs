//! `[store]` section configuration.
//!
//! Selects the remote content store assets are published to.
//!
//! # Example
//!
//! ```toml
//! [store]
//! provider = "github"             # github | local
//!
//! [store.github]
//! owner = "user"
//! repository = "assets"
//! branch = "main"
//! token_path = "~/.github-token"  # falls back to $GITHUB_TOKEN
//!
//! [store.local]
//! dir = "cdn"                     # mirror directory for provider = "local"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use macros::Config;
use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Environment variable consulted when `token_path` is unset.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    #[default]
    Github,
    Local,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "store")]
pub struct StoreConfig {
    /// Remote store backend: "github" or "local".
    #[config(default = "github")]
    pub provider: StoreProvider,

    #[config(sub_config)]
    pub github: GithubStoreConfig,

    #[config(sub_config)]
    pub local: LocalStoreConfig,
}

impl StoreConfig {
    pub fn normalize(&mut self, root: &Path) {
        if let Some(token_path) = self.github.token_path.take() {
            self.github.token_path = Some(normalize_token_path(&token_path, root));
        }
        self.local.dir = root.join(&self.local.dir);
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.provider == StoreProvider::Github {
            self.github.validate(diag);
        }
    }
}

/// GitHub contents API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "store.github")]
pub struct GithubStoreConfig {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub repository: String,

    /// Branch assets are committed to.
    #[config(default = "main")]
    pub branch: String,

    /// File holding a personal access token.
    ///
    /// Keep it outside the repository, e.g. `~/.github-token`.
    pub token_path: Option<PathBuf>,

    /// API endpoint (GitHub Enterprise installs use their own).
    #[config(default = "https://api.github.com")]
    pub api_url: String,

    /// Commit message, `{path}` is replaced with the remote key.
    #[config(default = "Upload {path}")]
    pub commit_message: String,

    /// Per-request timeout in seconds.
    #[config(default = "30")]
    pub timeout_secs: u64,
}

impl Default for GithubStoreConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repository: String::new(),
            branch: "main".to_string(),
            token_path: None,
            api_url: "https://api.github.com".to_string(),
            commit_message: "Upload {path}".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GithubStoreConfig {
    /// Credentials must be complete before any upload is attempted.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.owner.trim().is_empty() {
            diag.error(Self::FIELDS.owner, "required for provider = \"github\"");
        }
        if self.repository.trim().is_empty() {
            diag.error(Self::FIELDS.repository, "required for provider = \"github\"");
        }

        match &self.token_path {
            Some(path) if !path.is_file() => diag.error(
                Self::FIELDS.token_path,
                format!("token file not found: {}", path.display()),
            ),
            Some(_) => {}
            None if std::env::var_os(TOKEN_ENV).is_none() => diag.error_with_hint(
                Self::FIELDS.token_path,
                "no GitHub token configured",
                format!("set `token_path` or export {TOKEN_ENV}"),
            ),
            None => {}
        }
    }

    /// Read the token from `token_path`, falling back to `$GITHUB_TOKEN`.
    pub fn resolve_token(&self) -> Result<String> {
        let token = match &self.token_path {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read token file `{}`", path.display()))?,
            None => std::env::var(TOKEN_ENV).unwrap_or_default(),
        };

        let token = token.trim();
        if token.is_empty() {
            bail!("GitHub token is empty");
        }
        Ok(token.to_string())
    }
}

/// Local mirror directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "store.local")]
pub struct LocalStoreConfig {
    /// Directory remote keys are written under.
    #[config(default = "cdn")]
    pub dir: PathBuf,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cdn"),
        }
    }
}

/// Normalize token path with tilde expansion.
fn normalize_token_path(path: &Path, root: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(path.to_str().unwrap_or_default()).into_owned();
    let path = PathBuf::from(expanded);
    if path.is_relative() {
        root.join(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_store_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.store.provider, StoreProvider::Github);
        assert_eq!(config.store.github.branch, "main");
        assert_eq!(config.store.github.api_url, "https://api.github.com");
        assert_eq!(config.store.local.dir, PathBuf::from("cdn"));
    }

    #[test]
    fn test_store_local_provider() {
        let config = test_parse_config("[store]\nprovider = \"local\"\n[store.local]\ndir = \"out\"");
        assert_eq!(config.store.provider, StoreProvider::Local);
        assert_eq!(config.store.local.dir, PathBuf::from("out"));

        // local provider needs no credentials
        let mut diag = ConfigDiagnostics::default();
        config.store.validate(&mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_github_requires_owner_and_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        let token = dir.path().join("token");
        fs::write(&token, "secret\n").unwrap();

        let mut github = GithubStoreConfig {
            token_path: Some(token),
            ..GithubStoreConfig::default()
        };
        let mut diag = ConfigDiagnostics::default();
        github.validate(&mut diag);
        assert_eq!(diag.errors().len(), 2);

        github.owner = "user".into();
        github.repository = "assets".into();
        let mut diag = ConfigDiagnostics::default();
        github.validate(&mut diag);
        assert!(!diag.has_errors());
        assert_eq!(github.resolve_token().unwrap(), "secret");
    }

    #[test]
    fn test_missing_token_file() {
        let github = GithubStoreConfig {
            owner: "user".into(),
            repository: "assets".into(),
            token_path: Some(PathBuf::from("/nonexistent/token")),
            ..GithubStoreConfig::default()
        };
        let mut diag = ConfigDiagnostics::default();
        github.validate(&mut diag);
        assert_eq!(diag.errors()[0].field.as_str(), "store.github.token_path");
        assert!(github.resolve_token().is_err());
    }

    #[test]
    fn test_token_path_tilde_expansion() {
        let path = normalize_token_path(Path::new("~/.github-token"), Path::new("/site"));
        assert!(!path.to_string_lossy().starts_with('~'));

        let rel = normalize_token_path(Path::new("secrets/token"), Path::new("/site"));
        assert_eq!(rel, PathBuf::from("/site/secrets/token"));
    }
}
