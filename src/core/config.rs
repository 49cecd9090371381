//! Train configuration (train.toml) parsing
//!
//! Searched in order: train.toml, .train.toml. Every field has a default so
//! the file is optional; API tokens are never stored in the file and come
//! from the environment instead.

use crate::core::error::{TrainResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for release-train
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainConfig {
  #[serde(default)]
  pub api: ApiConfig,

  #[serde(default)]
  pub retry: RetrySettings,
}

/// Remote content API endpoints
///
/// The canonical endpoint serves normal releases; the dev endpoint serves
/// security releases; the ops endpoint hosts the deployer project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_endpoint")]
  pub endpoint: String,

  #[serde(default = "default_dev_endpoint")]
  pub dev_endpoint: String,

  #[serde(default = "default_ops_endpoint")]
  pub ops_endpoint: String,
}

fn default_endpoint() -> String {
  "https://gitlab.com/api/v4".to_string()
}

fn default_dev_endpoint() -> String {
  "https://dev.gitlab.org/api/v4".to_string()
}

fn default_ops_endpoint() -> String {
  "https://ops.gitlab.net/api/v4".to_string()
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      endpoint: default_endpoint(),
      dev_endpoint: default_dev_endpoint(),
      ops_endpoint: default_ops_endpoint(),
    }
  }
}

impl ApiConfig {
  /// Token for the canonical endpoint, from the environment
  pub fn token(&self) -> Option<String> {
    std::env::var("RELEASE_API_TOKEN").ok()
  }

  /// Token for the dev endpoint, from the environment
  pub fn dev_token(&self) -> Option<String> {
    std::env::var("RELEASE_DEV_API_TOKEN").ok()
  }

  /// Token for the ops endpoint, from the environment
  pub fn ops_token(&self) -> Option<String> {
    std::env::var("RELEASE_OPS_API_TOKEN").ok()
  }
}

/// Retry tuning for network read operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
  /// Total attempts, including the first one
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,

  /// Base backoff interval in seconds; attempt N sleeps N * base
  #[serde(default = "default_base_interval_secs")]
  pub base_interval_secs: u64,
}

fn default_max_attempts() -> u32 {
  3
}

fn default_base_interval_secs() -> u64 {
  5
}

impl Default for RetrySettings {
  fn default() -> Self {
    Self {
      max_attempts: default_max_attempts(),
      base_interval_secs: default_base_interval_secs(),
    }
  }
}

impl TrainConfig {
  /// Load configuration from the working directory, falling back to
  /// defaults when no config file exists.
  pub fn load(root: &Path) -> TrainResult<Self> {
    for candidate in ["train.toml", ".train.toml"] {
      let path = root.join(candidate);
      if path.exists() {
        let raw = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: TrainConfig = toml_edit::de::from_str(&raw)?;
        return Ok(config);
      }
    }

    Ok(TrainConfig::default())
  }
}
