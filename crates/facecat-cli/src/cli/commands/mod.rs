//! CLI command handlers, one file per command.

mod enroll;
mod forget;
mod group;
mod identify;
mod scan;
mod status;
mod train;

pub use enroll::run_enroll;
pub use forget::run_forget;
pub use group::run_group;
pub use identify::{run_identify, run_persons};
pub use scan::run_scan;
pub use status::run_status;
pub use train::run_train;

use anyhow::{bail, Result};
use facecat_core::config::FacecatConfig;
use facecat_core::dispatch::DispatchPolicy;
use facecat_core::retry::RetryPolicy;
use facecat_core::scan::BatchContext;
use facecat_core::service::HttpFaceClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn client(cfg: &FacecatConfig) -> Result<HttpFaceClient> {
    if cfg.subscription_key.trim().is_empty() {
        bail!(
            "no subscription key: set subscription_key in the config file or FACECAT_SUBSCRIPTION_KEY"
        );
    }
    HttpFaceClient::new(&cfg.endpoint, cfg.subscription_key.clone())
}

/// Token cancelled on the first Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupted, finishing requests in flight...");
            tracing::warn!("interrupt received, cancelling batch");
            child.cancel();
        }
    });
    token
}

/// Service, policies from config (with `jobs` overriding concurrency), and a
/// Ctrl-C token.
fn batch_context(cfg: &FacecatConfig, jobs: Option<usize>) -> Result<BatchContext> {
    let service = Arc::new(client(cfg)?);
    let retry = RetryPolicy::from_config(&cfg.retry_or_default());
    let mut dispatch = DispatchPolicy::from_config(&cfg.dispatch_or_default());
    if let Some(n) = jobs {
        dispatch.max_concurrency = n.max(1);
    }
    Ok(BatchContext::new(service, retry, dispatch).with_cancel(ctrl_c_token()))
}

fn print_dropped(report: &facecat_core::dispatch::DispatchReport<std::path::PathBuf>) {
    for d in &report.dropped {
        println!(
            "  {:<14} {}  ({})",
            format!("{:?}", d.outcome).to_lowercase(),
            d.item.display(),
            d.error
        );
    }
}
