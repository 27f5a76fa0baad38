//! `facecat scan` – detect faces in a folder and catalogue the results.

use anyhow::{Context, Result};
use facecat_core::catalog::Catalog;
use facecat_core::config::FacecatConfig;
use facecat_core::scan::{image_files, scan_folder};
use std::path::Path;

use super::{batch_context, print_dropped};

pub async fn run_scan(
    catalog: &Catalog,
    cfg: &FacecatConfig,
    dir: &Path,
    group: &str,
    recursive: bool,
    jobs: Option<usize>,
) -> Result<()> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("folder {}", dir.display()))?;
    let files = image_files(&dir, recursive)?;
    if files.is_empty() {
        println!("No images in {}.", dir.display());
        return Ok(());
    }
    let ctx = batch_context(cfg, jobs)?;
    let summary = scan_folder(&ctx, catalog, group, files).await?;
    let r = &summary.report;

    println!(
        "Scanned {} image(s), {} face(s) found, {} already catalogued.",
        r.completed, summary.faces_found, summary.skipped
    );
    if r.requeued_conflict + r.requeued_rate_limit > 0 {
        println!(
            "Re-queued {} after conflicts, {} after throttling.",
            r.requeued_conflict, r.requeued_rate_limit
        );
    }
    if r.dropped_count() > 0 {
        println!("{} image(s) not scanned:", r.dropped_count());
        print_dropped(r);
    }
    if r.cancelled > 0 {
        println!("Cancelled with {} image(s) left; run scan again to continue.", r.cancelled);
    }
    Ok(())
}
