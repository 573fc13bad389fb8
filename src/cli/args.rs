//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Push static and media assets to a remote content store
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: cdnpush.toml)
    #[arg(short = 'C', long, global = true, default_value = "cdnpush.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a commented cdnpush.toml into the current directory
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Upload assets by URL
    #[command(visible_alias = "u")]
    Upload {
        #[command(flatten)]
        args: UploadArgs,
    },

    /// List scripts currently published as split bundles
    #[command(visible_alias = "m")]
    Manifest {
        /// Print the manifest as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Upload command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct UploadArgs {
    /// Asset URLs, e.g. `/static/frontend/app.js` or `/media/catalog/a.png`
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Read URLs from a file (one per line, or a JSON array).
    /// Use `-` to read from stdin.
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Print the batch report as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Process assets in parallel
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub parallel: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    /// Whether stdout carries a JSON document.
    pub const fn json_output(&self) -> bool {
        match &self.command {
            Commands::Upload { args } => args.json,
            Commands::Manifest { json } => *json,
            Commands::Init { .. } => false,
        }
    }

    pub const fn upload_args(&self) -> Option<&UploadArgs> {
        match &self.command {
            Commands::Upload { args } => Some(args),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload() {
        let cli = Cli::parse_from([
            "cdnpush",
            "-C",
            "shop.toml",
            "upload",
            "/static/app.js",
            "/media/a.png",
            "--parallel",
            "--json",
        ]);
        assert_eq!(cli.config, PathBuf::from("shop.toml"));
        let args = cli.upload_args().unwrap();
        assert_eq!(args.urls, ["/static/app.js", "/media/a.png"]);
        assert_eq!(args.parallel, Some(true));
        assert!(args.json);
        assert!(cli.json_output());
    }

    #[test]
    fn test_parse_parallel_false() {
        let cli = Cli::parse_from(["cdnpush", "upload", "-f", "-", "--parallel", "false"]);
        let args = cli.upload_args().unwrap();
        assert_eq!(args.parallel, Some(false));
        assert_eq!(args.file, Some(PathBuf::from("-")));
        assert!(args.urls.is_empty());
    }

    #[test]
    fn test_init_has_no_upload_args() {
        let cli = Cli::parse_from(["cdnpush", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init { force: true }));
        assert!(cli.upload_args().is_none());
        assert!(!cli.json_output());
    }

    #[test]
    fn test_manifest_json_output() {
        let cli = Cli::parse_from(["cdnpush", "manifest", "--json"]);
        assert!(cli.json_output());
    }
}
