//! Person group lifecycle: create, list, delete groups and persons.
//!
//! Each call goes through the retry executor with the batch's hooks, so a
//! throttled or conflicting request is retried like any other.

use anyhow::Result;

use crate::catalog::Catalog;
use crate::retry::{run_void_with_retry, run_with_retry};
use crate::scan::BatchContext;
use crate::service::PersonGroup;

/// Create `group`. `name` defaults to the id; `user_data` is free text
/// (the source folder, for instance).
pub async fn create_group(
    ctx: &BatchContext,
    group: &str,
    name: Option<&str>,
    user_data: Option<&str>,
) -> Result<()> {
    let name = name.unwrap_or(group);
    run_void_with_retry(&ctx.retry, ctx.hooks(), || {
        ctx.service.create_group(group, name, user_data)
    })
    .await?;
    tracing::info!(group, name, "group created");
    Ok(())
}

pub async fn list_groups(ctx: &BatchContext) -> Result<Vec<PersonGroup>> {
    Ok(run_with_retry(&ctx.retry, ctx.hooks(), || ctx.service.list_groups()).await?)
}

/// Delete `group` on the service, then drop its files from `catalog`.
/// Returns the number of catalogue records removed.
pub async fn delete_group(ctx: &BatchContext, catalog: &Catalog, group: &str) -> Result<u64> {
    run_void_with_retry(&ctx.retry, ctx.hooks(), || ctx.service.delete_group(group)).await?;
    let forgotten = catalog.remove_group(group).await?;
    tracing::info!(group, forgotten, "group deleted");
    Ok(forgotten)
}

pub async fn delete_person(ctx: &BatchContext, group: &str, person: &str) -> Result<()> {
    run_void_with_retry(&ctx.retry, ctx.hooks(), || {
        ctx.service.delete_person(group, person)
    })
    .await?;
    tracing::info!(group, person, "person deleted");
    Ok(())
}
