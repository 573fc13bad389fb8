//! `cdnpush init`: write a commented configuration file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::config::{
    CONFIG_FILE, CdnSectionConfig, ManifestConfig, PathsConfig, SplitConfig, StoreConfig,
    WebpConfig,
};
use crate::log;

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore"];

/// Generate cdnpush.toml content with comments
pub fn generate_config_template() -> String {
    let sections = [
        CdnSectionConfig::template_with_header(),
        PathsConfig::template_with_header(),
        SplitConfig::template_with_header(),
        WebpConfig::template_with_header(),
        StoreConfig::template_with_header(),
        ManifestConfig::template_with_header(),
    ];

    let mut out = format!(
        "# cdnpush configuration file (v{})\n\n",
        env!("CARGO_PKG_VERSION")
    );
    out.push_str(&sections.join("\n"));
    out
}

/// Write `cdnpush.toml` into `root`.
pub fn write_config(root: &Path, force: bool) -> Result<()> {
    let path = root.join(CONFIG_FILE);
    if path.exists() && !force {
        bail!("'{}' already exists, use --force to overwrite", path.display());
    }

    fs::write(&path, generate_config_template())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    write_ignore_files(root)?;

    log!("init"; "wrote {}", path.display());
    Ok(())
}

/// Keep the manifest directory out of version control.
fn write_ignore_files(root: &Path) -> Result<()> {
    for filename in IGNORE_FILES {
        let path = root.join(filename);
        // Only create if doesn't exist (don't overwrite user's ignore files)
        if !path.exists() {
            fs::write(&path, "/.cdnpush/\n")
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_template_parses_to_defaults() {
        let template = generate_config_template();
        for section in ["[cdn]", "[paths]", "[split]", "[webp]", "[store]", "[store.github]", "[store.local]", "[manifest]"] {
            let headers = template.lines().filter(|line| line.trim() == section).count();
            assert_eq!(headers, 1, "{section}");
        }

        let config = test_parse_config(&template);
        assert_eq!(config.split, SplitConfig::default());
        assert_eq!(config.webp, WebpConfig::default());
        assert_eq!(config.store.github.branch, "main");
    }

    #[test]
    fn test_init_then_load() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), false).unwrap();

        let content = fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
        let mut config = test_parse_config(&content);
        config.finalize(&temp.path().join(CONFIG_FILE));
        assert!(config.store.local.dir.starts_with(&config.root));
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), false).unwrap();
        assert!(temp.path().join(CONFIG_FILE).exists());
        assert!(write_config(temp.path(), false).is_err());
        assert!(write_config(temp.path(), true).is_ok());
    }

    #[test]
    fn test_ignore_files_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let gitignore = temp.path().join(".gitignore");
        fs::write(&gitignore, "custom content").unwrap();

        write_config(temp.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&gitignore).unwrap(), "custom content");
    }
}
