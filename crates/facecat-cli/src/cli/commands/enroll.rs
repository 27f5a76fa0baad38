//! `facecat enroll` / `facecat enroll-tree` – create persons from face images.

use anyhow::{Context, Result};
use facecat_core::config::FacecatConfig;
use facecat_core::scan::{enroll_person, enroll_tree, image_files, EnrollSummary};
use facecat_core::training::train_and_wait;
use std::path::Path;
use std::time::Duration;

use super::{batch_context, print_dropped};

/// With `name`, enrol `dir` as that person; without, enrol each subfolder.
pub async fn run_enroll(
    cfg: &FacecatConfig,
    group: &str,
    name: Option<&str>,
    dir: &Path,
    jobs: Option<usize>,
    train: bool,
) -> Result<()> {
    let ctx = batch_context(cfg, jobs)?;
    let people = match name {
        Some(name) => {
            let files =
                image_files(dir, false).with_context(|| format!("folder {}", dir.display()))?;
            if files.is_empty() {
                anyhow::bail!("no images in {}", dir.display());
            }
            vec![enroll_person(&ctx, group, name, files).await?]
        }
        None => enroll_tree(&ctx, group, dir).await?,
    };
    if people.is_empty() {
        anyhow::bail!("no subfolders with images in {}", dir.display());
    }

    let mut cancelled = false;
    for summary in &people {
        print_summary(summary);
        cancelled |= summary.report.cancelled > 0;
    }
    if cancelled || ctx.cancel.is_cancelled() {
        return Ok(());
    }

    if train {
        let status = train_and_wait(
            ctx.service.as_ref(),
            group,
            &ctx.retry,
            Duration::from_millis(cfg.training_poll_ms),
            Some(&ctx.cancel),
        )
        .await?;
        println!("Training {}: {:?}", group, status.status);
    }
    Ok(())
}

fn print_summary(summary: &EnrollSummary) {
    let r = &summary.report;
    println!(
        "Person {} ({}): {} face(s) added.",
        summary.name,
        summary.person_id,
        summary.faces_added.len()
    );
    if r.warning_tally() > 0 {
        println!(
            "{} image(s) skipped: more or less than one face detected.",
            r.warning_tally()
        );
    }
    if r.dropped_count() > 0 {
        print_dropped(r);
    }
    if r.cancelled > 0 {
        println!("Cancelled with {} image(s) not uploaded.", r.cancelled);
    }
}
