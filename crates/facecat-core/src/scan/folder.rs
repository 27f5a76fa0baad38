//! Folder scan: detect faces in every new image and record it in the catalogue.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{Catalog, FileRecord, FileState};
use crate::dispatch::{DispatchReport, ItemOutcome, WorkQueue};
use crate::remote::{ErrorCode, RemoteError};
use crate::retry::{run_with_retry, RetryError, RetryHooks, TransientCodes};

use super::BatchContext;

/// Result of [`scan_folder`].
#[derive(Debug)]
pub struct ScanSummary {
    /// Files already in the catalogue (and not marked failed).
    pub skipped: usize,
    /// Total faces found in successfully scanned files.
    pub faces_found: usize,
    pub report: DispatchReport<PathBuf>,
}

/// Detect faces in each of `files` not yet catalogued and record the result
/// against `group`.
///
/// Detection of a single image retries throttling through the retry
/// executor; conflicts are re-queued by the dispatcher. Unprocessable and
/// failed images are recorded too, failed ones so a later scan retries them.
pub async fn scan_folder(
    ctx: &BatchContext,
    catalog: &Catalog,
    group: &str,
    files: Vec<PathBuf>,
) -> Result<ScanSummary> {
    let queue = WorkQueue::new();
    let mut skipped = 0usize;
    for path in files {
        let key = path_key(&path);
        match catalog.get_file(&key).await? {
            Some(rec) if rec.state != FileState::Failed => skipped += 1,
            _ => queue.push(path),
        }
    }
    tracing::info!(group, pending = queue.len(), skipped, "scanning folder");

    let retry = Arc::new(ctx.retry.with_transient(TransientCodes::rate_limit_only()));
    let service = Arc::clone(&ctx.service);
    let cancel = ctx.cancel.clone();
    let mut detected: Vec<(PathBuf, usize)> = Vec::new();

    let report = ctx
        .dispatcher()
        .run(
            &queue,
            move |path: PathBuf| {
                let service = Arc::clone(&service);
                let retry = Arc::clone(&retry);
                let cancel = cancel.clone();
                async move {
                    let image = read_image(&path).await?;
                    let hooks = RetryHooks::traced().cancel(&cancel);
                    run_with_retry(&retry, hooks, || service.detect_faces(image.clone()))
                        .await
                        .map(|faces| faces.len())
                        .map_err(RetryError::into_remote)
                }
            },
            |path, faces| detected.push((path.clone(), faces)),
        )
        .await;

    let mut faces_found = 0usize;
    for (path, faces) in &detected {
        faces_found += faces;
        let record =
            FileRecord::new(path_key(path), group, FileState::Scanned).with_faces(*faces as u32);
        catalog.upsert_file(&record).await?;
    }
    for dropped in &report.dropped {
        let state = match dropped.outcome {
            ItemOutcome::Unprocessable => FileState::Unprocessable,
            _ => FileState::Failed,
        };
        let record = FileRecord::new(path_key(&dropped.item), group, state)
            .with_note(dropped.error.to_string());
        catalog.upsert_file(&record).await?;
    }
    if report.warning_tally() > 0 {
        tracing::warn!(
            "{} image(s) could not be processed and were not catalogued as scanned",
            report.warning_tally()
        );
    }

    Ok(ScanSummary {
        skipped,
        faces_found,
        report,
    })
}

/// Catalogue key for a file.
pub(super) fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Read an image; an unreadable file is treated as unprocessable input.
pub(super) async fn read_image(path: &Path) -> Result<Vec<u8>, RemoteError> {
    tokio::fs::read(path).await.map_err(|e| {
        RemoteError::new(
            ErrorCode::InvalidImage,
            format!("could not read {}: {}", path.display(), e),
        )
    })
}
