//! `facecat group` – create, list and delete person groups.

use anyhow::Result;
use facecat_core::catalog::Catalog;
use facecat_core::config::FacecatConfig;
use facecat_core::groups;

use super::batch_context;
use crate::cli::GroupAction;

pub async fn run_group(cfg: &FacecatConfig, action: GroupAction) -> Result<()> {
    let ctx = batch_context(cfg, None)?;
    match action {
        GroupAction::Create { group, name } => {
            groups::create_group(&ctx, &group, name.as_deref(), None).await?;
            println!("Created group {}.", group);
        }
        GroupAction::List => {
            let all = groups::list_groups(&ctx).await?;
            if all.is_empty() {
                println!("No groups.");
            } else {
                println!("{:<38} {}", "GROUP", "NAME");
                for g in all {
                    println!("{:<38} {}", g.large_person_group_id, g.name);
                }
            }
        }
        GroupAction::Delete { group } => {
            let catalog = Catalog::open_default().await?;
            let forgotten = groups::delete_group(&ctx, &catalog, &group).await?;
            println!("Deleted group {} ({} catalogued file(s) forgotten).", group, forgotten);
        }
        GroupAction::RemovePerson { group, person } => {
            groups::delete_person(&ctx, &group, &person).await?;
            println!("Removed person {} from {}.", person, group);
        }
    }
    Ok(())
}
