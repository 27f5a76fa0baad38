use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides `subscription_key` from the file.
pub const SUBSCRIPTION_KEY_ENV: &str = "FACECAT_SUBSCRIPTION_KEY";

/// Retry executor parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Fixed delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Optional per-attempt timeout in seconds.
    #[serde(default)]
    pub attempt_timeout_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 60,
            retry_delay_ms: 1000,
            attempt_timeout_secs: None,
        }
    }
}

/// Batch dispatcher parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum concurrent service calls per batch.
    pub max_concurrency: usize,
    /// Pause before launching more work after a rate-limit response.
    pub rate_limit_pause_ms: u64,
    /// Re-queues allowed per item before it is dropped; 0 means unlimited.
    #[serde(default = "default_max_requeues")]
    pub max_requeues: u32,
    /// Optional time budget for one item, in seconds.
    #[serde(default)]
    pub item_timeout_secs: Option<u64>,
    /// Use "launch N, await all" passes instead of a sliding window.
    #[serde(default)]
    pub barrier: bool,
}

fn default_max_requeues() -> u32 {
    100
}

impl DispatchConfig {
    /// Re-queue cap as the dispatcher takes it (`None` = unlimited).
    pub fn requeue_cap(&self) -> Option<u32> {
        (self.max_requeues > 0).then_some(self.max_requeues)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            rate_limit_pause_ms: 1000,
            max_requeues: default_max_requeues(),
            item_timeout_secs: None,
            barrier: false,
        }
    }
}

/// Global configuration loaded from `~/.config/facecat/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacecatConfig {
    /// Face service API root, e.g. `https://westus.api.cognitive.microsoft.com/face/v1.0`.
    pub endpoint: String,
    /// Subscription key sent with every request.
    #[serde(default)]
    pub subscription_key: String,
    /// Interval between training status polls in milliseconds.
    pub training_poll_ms: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional dispatcher tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub dispatch: Option<DispatchConfig>,
}

impl Default for FacecatConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::service::DEFAULT_API_ROOT.to_string(),
            subscription_key: String::new(),
            training_poll_ms: 1000,
            retry: None,
            dispatch: None,
        }
    }
}

impl FacecatConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn dispatch_or_default(&self) -> DispatchConfig {
        self.dispatch.clone().unwrap_or_default()
    }

    /// Replace the subscription key with `FACECAT_SUBSCRIPTION_KEY` when set.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(SUBSCRIPTION_KEY_ENV) {
            if !key.trim().is_empty() {
                self.subscription_key = key.trim().to_string();
            }
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("facecat")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FacecatConfig> {
    let path = config_path()?;
    let mut cfg = if !path.exists() {
        let default_cfg = FacecatConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        default_cfg
    } else {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data)?
    };
    cfg.apply_env();
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FacecatConfig::default();
        assert_eq!(cfg.training_poll_ms, 1000);
        assert!(cfg.endpoint.starts_with("https://"));
        let retry = cfg.retry_or_default();
        assert_eq!(retry.max_retries, 60);
        assert_eq!(retry.retry_delay_ms, 1000);
        let dispatch = cfg.dispatch_or_default();
        assert_eq!(dispatch.max_concurrency, 4);
        assert_eq!(dispatch.rate_limit_pause_ms, 1000);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FacecatConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FacecatConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.endpoint, cfg.endpoint);
        assert_eq!(parsed.training_poll_ms, cfg.training_poll_ms);
        assert!(parsed.retry.is_none());
    }

    #[test]
    fn config_toml_sections() {
        let toml = r#"
            endpoint = "https://example.test/face/v1.0"
            subscription_key = "abc"
            training_poll_ms = 250

            [retry]
            max_retries = 3
            retry_delay_ms = 50
            attempt_timeout_secs = 20

            [dispatch]
            max_concurrency = 8
            rate_limit_pause_ms = 500
            barrier = true
        "#;
        let cfg: FacecatConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.subscription_key, "abc");
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.attempt_timeout_secs, Some(20));
        let dispatch = cfg.dispatch.as_ref().unwrap();
        assert_eq!(dispatch.max_concurrency, 8);
        assert!(dispatch.barrier);
        assert_eq!(dispatch.max_requeues, 100);
        assert_eq!(dispatch.requeue_cap(), Some(100));
    }

    #[test]
    fn partial_dispatch_table_keeps_requeue_cap() {
        use crate::dispatch::DispatchPolicy;

        let toml = r#"
            endpoint = "https://example.test/face/v1.0"
            training_poll_ms = 1000

            [dispatch]
            max_concurrency = 8
            rate_limit_pause_ms = 1000
        "#;
        let cfg: FacecatConfig = toml::from_str(toml).unwrap();
        let policy = DispatchPolicy::from_config(&cfg.dispatch_or_default());
        assert_eq!(policy.max_concurrency, 8);
        assert_eq!(policy.max_requeues, Some(100));
    }

    #[test]
    fn zero_requeues_means_unlimited() {
        use crate::dispatch::DispatchPolicy;

        let cfg: DispatchConfig =
            toml::from_str("max_concurrency = 2\nrate_limit_pause_ms = 10\nmax_requeues = 0\n")
                .unwrap();
        assert_eq!(cfg.requeue_cap(), None);
        assert_eq!(DispatchPolicy::from_config(&cfg).max_requeues, None);
    }

    #[test]
    fn policies_follow_config() {
        use crate::dispatch::{DispatchMode, DispatchPolicy};
        use crate::retry::RetryPolicy;
        use std::time::Duration;

        let retry = RetryPolicy::from_config(&RetryConfig {
            max_retries: 5,
            retry_delay_ms: 20,
            attempt_timeout_secs: Some(3),
        });
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.retry_delay, Duration::from_millis(20));
        assert_eq!(retry.attempt_timeout, Some(Duration::from_secs(3)));

        let dispatch = DispatchPolicy::from_config(&DispatchConfig {
            max_concurrency: 0,
            barrier: true,
            ..DispatchConfig::default()
        });
        assert_eq!(dispatch.max_concurrency, 1);
        assert_eq!(dispatch.mode, DispatchMode::Barrier);
        assert_eq!(dispatch.max_requeues, Some(100));
    }
}
