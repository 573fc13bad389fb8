//! `cdnpush manifest`: show the split manifest.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use crate::config::CdnConfig;
use crate::log;
use crate::manifest::{ManifestFile, ManifestStore, SplitManifest};
use crate::utils::plural_count;

pub fn show_manifest(config: &CdnConfig, json: bool) -> Result<()> {
    let store = ManifestFile::new(config.manifest.path.clone());
    let manifest = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    if manifest.is_empty() {
        log!("manifest"; "no split scripts recorded in {}", store.path().display());
        return Ok(());
    }
    print!("{}", render(&manifest));
    log!("manifest"; "{}", plural_count(manifest.len(), "split script"));
    Ok(())
}

fn render(manifest: &SplitManifest) -> String {
    let mut out = String::new();
    for record in manifest.records() {
        let chunks = format!("({})", plural_count(record.chunks, "chunk"));
        out.push_str(&format!(
            "{} → {} {}\n",
            record.original,
            record.loader,
            chunks.if_supports_color(Stream::Stdout, |t| t.dimmed())
        ));
    }
    out
}
