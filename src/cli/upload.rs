//! `cdnpush upload`: run one batch and report it.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::{AnsiColors, OwoColorize, Stream::{Stderr, Stdout}, Style};

use super::UploadArgs;
use crate::config::CdnConfig;
use crate::debug;
use crate::logger::ProgressLine;
use crate::pipeline::{AssetOutcome, BatchResult, BatchStatus, Pipeline, WebpOutcome};

pub fn run_upload(args: &UploadArgs, config: &CdnConfig) -> Result<()> {
    let urls = collect_urls(args)?;
    if urls.is_empty() {
        bail!("no URLs given, pass them as arguments or with --file");
    }

    let pipeline = Pipeline::from_config(config)?;
    debug!("upload"; "{} urls via {} store", urls.len(), pipeline.store_name());

    let result = if args.json {
        pipeline.process_batch(&urls, None)
    } else {
        let progress = ProgressLine::new("assets", urls.len());
        let result = pipeline.process_batch(&urls, Some(&progress));
        progress.finish();
        result
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.report())?);
    } else {
        print_result(&result);
    }

    if result.error.is_some() || (result.status() == BatchStatus::Failure && result.total > 0) {
        std::process::exit(1);
    }
    Ok(())
}

/// URLs from arguments first, then from `--file`.
fn collect_urls(args: &UploadArgs) -> Result<Vec<String>> {
    let mut urls = args.urls.clone();
    if let Some(file) = &args.file {
        let content = read_source(file)?;
        urls.extend(parse_url_list(&content)?);
    }
    Ok(urls)
}

fn read_source(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read URLs from stdin")?;
        return Ok(content);
    }
    fs::read_to_string(file).with_context(|| format!("Failed to read '{}'", file.display()))
}

/// A JSON array of strings, or one URL per line (`#` comments allowed).
fn parse_url_list(content: &str) -> Result<Vec<String>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let urls: Vec<String> =
            serde_json::from_str(trimmed).context("Invalid URL list, expected a JSON array of strings")?;
        return Ok(urls);
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn print_result(result: &BatchResult) {
    if let Some(error) = &result.error {
        eprintln!("{} {}", "error:".if_supports_color(Stderr, |t| t.style(Style::new().red().bold())), error);
    }

    print!("{}", render_details(result));

    if let Some(error) = &result.manifest_error {
        eprintln!(
            "{} split manifest not saved: {}",
            "warning:".if_supports_color(Stderr, |t| t.style(Style::new().yellow().bold())),
            error
        );
    }

    let summary = result.summary();
    let color = match result.status() {
        BatchStatus::Success => AnsiColors::Green,
        BatchStatus::Partial => AnsiColors::Yellow,
        BatchStatus::Failure => AnsiColors::Red,
    };
    println!("{}", summary.if_supports_color(Stdout, |t| t.color(color)));
}

/// One line per asset, plus one per WebP variant.
fn render_details(result: &BatchResult) -> String {
    let mut out = String::new();
    for detail in result.details() {
        let mark = match &detail.outcome {
            AssetOutcome::Skipped { .. } => "-".if_supports_color(Stdout, |t| t.dimmed()).to_string(),
            AssetOutcome::Failed(_) => "✗".if_supports_color(Stdout, |t| t.red()).to_string(),
            _ => "✓".if_supports_color(Stdout, |t| t.green()).to_string(),
        };
        let message = detail.outcome.message();
        out.push_str(&format!(
            "{mark} {} {}\n",
            detail.url,
            message.if_supports_color(Stdout, |t| t.dimmed())
        ));

        match &detail.webp {
            WebpOutcome::None => {}
            WebpOutcome::Converted { remote_path } => {
                out.push_str(&format!(
                    "  {} webp {}\n",
                    "✓".if_supports_color(Stdout, |t| t.green()),
                    remote_path.if_supports_color(Stdout, |t| t.dimmed())
                ));
            }
            WebpOutcome::ConversionFailed(err) => {
                let reason = err.to_string();
                out.push_str(&format!(
                    "  {} webp {}\n",
                    "✗".if_supports_color(Stdout, |t| t.red()),
                    reason.if_supports_color(Stdout, |t| t.dimmed())
                ));
            }
        }
    }
    out
}
