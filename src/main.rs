//! cdnpush - push static and media assets to a remote content store.

mod asset;
mod cli;
mod config;
mod core;
mod image;
mod logger;
mod manifest;
mod pipeline;
mod split;
mod store;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::CdnConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    if let Some(args) = cli.upload_args() {
        logger::set_verbose(args.verbose);
    }
    // Keep stdout clean for JSON output
    logger::set_log_to_stderr(cli.json_output());

    // init runs before a config file exists
    if let Commands::Init { force } = &cli.command {
        let cwd = std::env::current_dir()?;
        return cli::init::write_config(&cwd, *force);
    }

    let config = CdnConfig::load(&cli)?;

    match &cli.command {
        Commands::Upload { args } => cli::upload::run_upload(args, &config),
        Commands::Manifest { json } => cli::manifest::show_manifest(&config, *json),
        Commands::Init { .. } => Ok(()),
    }
}
