//! `facecat train` – train a person group.

use anyhow::Result;
use facecat_core::config::FacecatConfig;
use facecat_core::service::TrainingState;
use facecat_core::training::train_and_wait;
use std::time::Duration;

use super::batch_context;

pub async fn run_train(cfg: &FacecatConfig, group: &str) -> Result<()> {
    let ctx = batch_context(cfg, None)?;
    let status = train_and_wait(
        ctx.service.as_ref(),
        group,
        &ctx.retry,
        Duration::from_millis(cfg.training_poll_ms),
        Some(&ctx.cancel),
    )
    .await?;
    match status.status {
        TrainingState::Succeeded => println!("Training {} succeeded.", group),
        other => anyhow::bail!(
            "training {} ended as {:?}: {}",
            group,
            other,
            status.message.as_deref().unwrap_or("no message")
        ),
    }
    Ok(())
}
