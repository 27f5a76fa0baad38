//! Person enrolment: create a person and upload every face image for it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dispatch::{DispatchReport, WorkQueue};
use crate::retry::run_with_retry;
use crate::service::{PersistedFaceId, PersonId};

use super::files::image_files;
use super::folder::{path_key, read_image};
use super::BatchContext;

/// Result of [`enroll_person`].
#[derive(Debug)]
pub struct EnrollSummary {
    pub name: String,
    pub person_id: PersonId,
    pub faces_added: Vec<(PathBuf, PersistedFaceId)>,
    pub report: DispatchReport<PathBuf>,
}

/// Create person `name` in `group` and add one face per image in `files`.
///
/// Face uploads conflict with each other on the same person, so they are
/// dispatched without an inner retry: the dispatcher re-queues conflicts
/// and throttled uploads. Images with more than one face are counted in the
/// report's warning tally.
pub async fn enroll_person(
    ctx: &BatchContext,
    group: &str,
    name: &str,
    files: Vec<PathBuf>,
) -> Result<EnrollSummary> {
    let service = Arc::clone(&ctx.service);
    let person_id = run_with_retry(&ctx.retry, ctx.hooks(), || {
        service.create_person(group, name, None)
    })
    .await?;
    tracing::info!(group, name, person_id = %person_id, "person created");

    let queue: WorkQueue<PathBuf> = files.into_iter().collect();
    let group_owned = group.to_string();
    let person = person_id.clone();
    let mut faces_added = Vec::new();

    let report = ctx
        .dispatcher()
        .run(
            &queue,
            move |path: PathBuf| {
                let service = Arc::clone(&service);
                let group = group_owned.clone();
                let person = person.clone();
                async move {
                    let image = read_image(&path).await?;
                    let user_data = path_key(&path);
                    service
                        .add_person_face(&group, &person, image, Some(&user_data))
                        .await
                }
            },
            |path, face_id| faces_added.push((path.clone(), face_id)),
        )
        .await;

    if report.warning_tally() > 0 {
        tracing::warn!(
            "more or less than one face is detected in {} image(s), can not add to person {}",
            report.warning_tally(),
            name
        );
    }
    tracing::info!(person_id = %person_id, faces = faces_added.len(), "enrolment finished");

    Ok(EnrollSummary {
        name: name.to_string(),
        person_id,
        faces_added,
        report,
    })
}

/// Enrol one person per subfolder of `root`, named after the subfolder.
///
/// Subfolders without images are skipped. Stops before the next person
/// once the batch is cancelled.
pub async fn enroll_tree(ctx: &BatchContext, group: &str, root: &Path) -> Result<Vec<EnrollSummary>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut people = Vec::new();
    for dir in dirs {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let files = image_files(&dir, false)?;
        let Some(name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if files.is_empty() {
            tracing::debug!(dir = %dir.display(), "no images, skipping");
            continue;
        }
        people.push(enroll_person(ctx, group, &name, files).await?);
    }
    Ok(people)
}
