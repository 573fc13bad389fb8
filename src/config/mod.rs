//! Configuration management for `cdnpush.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One module per TOML section
//! ├── types/         # ConfigError, diagnostics, field paths, field status
//! └── mod.rs         # CdnConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                        |
//! |--------------|------------------------------------------------|
//! | `[cdn]`      | Master switch, upload size limit, parallelism  |
//! | `[paths]`    | URL prefixes and local roots                   |
//! | `[split]`    | Script splitting                               |
//! | `[webp]`     | WebP variants                                  |
//! | `[store]`    | Remote content store                           |
//! | `[manifest]` | Split manifest file                            |
//!
//! The loaded value is immutable; the pipeline receives clones of the
//! sections it needs at construction time.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    CdnSectionConfig, GithubStoreConfig, LocalStoreConfig, ManifestConfig, PathsConfig,
    SplitConfig, StoreConfig, StoreProvider, WebpConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{cli::Cli, log};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "cdnpush.toml";

/// Root configuration structure representing cdnpush.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdnConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub cdn: CdnSectionConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub webp: WebpConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,
}

impl CdnConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file; the project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let Some(config_path) = find_config_file(&cli.config, &cwd) else {
            bail!(ConfigError::NotFound(cli.config.clone()));
        };

        let mut config = Self::from_path(&config_path)?;
        config.finalize(&config_path);
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
            if !Self::prompt_continue()? {
                bail!("Aborted due to unknown config fields");
            }
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        eprintln!();
        log!("warning"; "unknown fields in {}:", display_path);
        log!("warning"; "ignoring:");
        for field in fields {
            eprintln!("- {}", field);
        }
        eprintln!();
    }

    /// Prompt user to continue. Returns true only if user explicitly confirms.
    fn prompt_continue() -> Result<bool> {
        use std::io::{self, Write};

        eprint!("Continue? [y/N] ");
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }

    /// Record the config location and resolve every relative path against it.
    pub fn finalize(&mut self, config_path: &Path) {
        self.config_path = crate::utils::path::normalize_path(config_path);
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.normalize_paths(&root);
        self.root = root;
    }

    fn normalize_paths(&mut self, root: &Path) {
        self.paths.normalize(root);
        self.split.normalize(root);
        self.store.normalize(root);
        self.manifest.normalize(root);
    }

    /// Apply command-specific CLI overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(args) = cli.upload_args()
            && let Some(parallel) = args.parallel
        {
            self.cdn.parallel = parallel;
        }
    }

    /// Validate configuration, collecting all errors at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::with_allow_experimental(self.cdn.allow_experimental);

        self.split.validate_field_status(&mut diag);

        self.cdn.validate(&mut diag);
        self.paths.validate(&mut diag);
        self.split.validate(&mut diag);
        self.store.validate(&mut diag);

        diag.print_hints();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> CdnConfig {
    let (parsed, ignored) = CdnConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
