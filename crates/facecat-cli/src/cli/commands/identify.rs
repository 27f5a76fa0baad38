//! `facecat persons` and `facecat identify` – query a trained group.

use anyhow::{Context, Result};
use facecat_core::config::FacecatConfig;
use facecat_core::retry::run_with_retry;
use facecat_core::service::{Candidate, DetectedFace, FaceRectangle, IdentifyResult};
use std::path::Path;

use super::batch_context;

pub async fn run_persons(cfg: &FacecatConfig, group: &str) -> Result<()> {
    let ctx = batch_context(cfg, None)?;
    let persons = run_with_retry(&ctx.retry, ctx.hooks(), || {
        ctx.service.list_persons(group)
    })
    .await?;
    if persons.is_empty() {
        println!("No persons in {}.", group);
        return Ok(());
    }
    println!("{:<38} {:<6} {}", "PERSON", "FACES", "NAME");
    for p in persons {
        println!("{:<38} {:<6} {}", p.person_id, p.persisted_face_ids.len(), p.name);
    }
    Ok(())
}

pub async fn run_identify(
    cfg: &FacecatConfig,
    group: &str,
    image: &Path,
    candidates: u32,
) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("read {}", image.display()))?;
    let ctx = batch_context(cfg, None)?;

    let faces = run_with_retry(&ctx.retry, ctx.hooks(), || {
        ctx.service.detect_faces(bytes.clone())
    })
    .await?;
    let face_ids: Vec<String> = faces.iter().filter_map(|f| f.face_id.clone()).collect();
    if face_ids.is_empty() {
        println!("No faces in {}.", image.display());
        return Ok(());
    }

    let results = run_with_retry(&ctx.retry, ctx.hooks(), || {
        ctx.service.identify(group, &face_ids, candidates)
    })
    .await?;
    for (rect, best) in match_results(&faces, &results) {
        match best {
            Some(c) => println!(
                "face at ({}, {}) {}x{}: {} ({:.2})",
                rect.left, rect.top, rect.width, rect.height, c.person_id, c.confidence
            ),
            None => println!(
                "face at ({}, {}) {}x{}: unknown",
                rect.left, rect.top, rect.width, rect.height
            ),
        }
    }
    Ok(())
}

/// Pair each detected face with the top candidate identified for its face id.
/// Faces without an id, or with no result, get `None`.
fn match_results<'a>(
    faces: &[DetectedFace],
    results: &'a [IdentifyResult],
) -> Vec<(FaceRectangle, Option<&'a Candidate>)> {
    faces
        .iter()
        .map(|face| {
            let best = face.face_id.as_deref().and_then(|id| {
                results
                    .iter()
                    .find(|r| r.face_id == id)
                    .and_then(|r| r.candidates.first())
            });
            (face.face_rectangle, best)
        })
        .collect()
}
