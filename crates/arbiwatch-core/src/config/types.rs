//! Configuration type definitions for arbiwatch.
//!
//! These types are serialized/deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://signals.example.com"
//! timeout_secs = 20
//!
//! [refresh]
//! interval_secs = 300
//! credential_poll_ms = 500
//! tick_ms = 1000
//! server_sync = true
//!
//! [credential]
//! token_env = "ARBIWATCH_TOKEN"
//! token_file = "/home/me/.arbiwatch/token"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration loaded from TOML config files.
///
/// Loaded from (later overrides earlier):
/// 1. User config: `~/.arbiwatch/config.toml`
/// 2. Project config: `./.arbiwatch/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ArbiwatchConfig {
    /// Remote signal API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Refresh cadence settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Where the bearer credential comes from
    #[serde(default)]
    pub credential: CredentialConfig,
}

/// Remote signal API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL every source path is appended to.
    #[serde(default = "super::defaults::default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    /// Default: 20 seconds.
    #[serde(default = "super::defaults::default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Refresh cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshConfig {
    /// Seconds between the end of one cycle and the start of the next.
    /// Default: 300 seconds.
    #[serde(default = "super::defaults::default_interval_secs")]
    pub interval_secs: u64,

    /// How often to look for a credential before the first cycle.
    /// Default: 500ms.
    #[serde(default = "super::defaults::default_credential_poll_ms")]
    pub credential_poll_ms: u64,

    /// Countdown recompute period.
    /// Default: 1000ms.
    #[serde(default = "super::defaults::default_tick_ms")]
    pub tick_ms: u64,

    /// Adopt the server-reported next refresh time when available.
    /// Default: true.
    #[serde(default = "super::defaults::default_server_sync")]
    pub server_sync: bool,
}

/// Credential lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialConfig {
    /// Environment variable holding the bearer token.
    #[serde(default = "super::defaults::default_token_env")]
    pub token_env: String,

    /// Optional file holding the bearer token. Checked after the env var.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn credential_poll(&self) -> Duration {
        Duration::from_millis(self.credential_poll_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
