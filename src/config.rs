// ABOUTME: TOML configuration for the console: API endpoint, polling and retry policy
// ABOUTME: Every section has defaults so a missing or partial file still loads

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::polling::PollConfig;
use crate::retry::RetryConfig;

pub const DEFAULT_NAMESPACE: &str = "openshift-migration";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub namespace: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:6443".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub pv_interval_ms: u64,
    pub pv_max_ticks: u32,
    pub plan_interval_ms: u64,
    pub plan_max_ticks: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            pv_interval_ms: 5000,
            pv_max_ticks: 20,
            plan_interval_ms: 5000,
            plan_max_ticks: 8,
        }
    }
}

impl PollingConfig {
    pub fn pv_discovery(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_millis(self.pv_interval_ms),
            self.pv_max_ticks,
            "Timed out during PV discovery",
        )
    }

    pub fn plan_status(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_millis(self.plan_interval_ms),
            self.plan_max_ticks,
            "Plan status timed out",
        )
    }

    pub fn plan_closed(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_millis(self.plan_interval_ms),
            self.plan_max_ticks,
            "Timed out during plan close",
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 10_000,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }
}

impl ConsoleConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, s).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg: ConsoleConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, ConsoleConfig::default());
        assert_eq!(cfg.api.namespace, DEFAULT_NAMESPACE);
        assert_eq!(cfg.polling.pv_max_ticks, 20);
        assert_eq!(cfg.polling.plan_max_ticks, 8);
        assert_eq!(cfg.retry.to_retry_config(), RetryConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let cfg: ConsoleConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://api.cluster.example:6443"

            [polling]
            pv_max_ticks = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://api.cluster.example:6443");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.polling.pv_max_ticks, 5);
        assert_eq!(cfg.polling.pv_interval_ms, 5000);

        let pv = cfg.polling.pv_discovery();
        assert_eq!(pv.max_ticks, 5);
        assert_eq!(pv.timeout_message, "Timed out during PV discovery");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("console.toml");

        let mut cfg = ConsoleConfig::default();
        cfg.api.token = Some("sha256~abc".to_string());
        cfg.retry.max_attempts = 5;
        cfg.save_to(&path).unwrap();

        assert_eq!(ConsoleConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = ConsoleConfig::load_from(Path::new("/nonexistent/console.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/console.toml"));
    }
}
