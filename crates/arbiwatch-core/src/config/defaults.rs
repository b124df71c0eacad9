//! Default implementations for configuration types.
//!
//! Holds the `Default` impls and the helper functions serde uses for
//! `#[serde(default = "...")]` attributes.

use crate::config::types::{ApiConfig, CredentialConfig, RefreshConfig};

/// Returns the default API base URL.
pub fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Returns the default request timeout (20s).
pub fn default_timeout_secs() -> u64 {
    20
}

/// Returns the default refresh interval (300s).
///
/// The dashboard shows the countdown as minutes and seconds, so the cadence
/// is on the order of minutes.
pub fn default_interval_secs() -> u64 {
    300
}

/// Returns the default credential poll period (500ms).
pub fn default_credential_poll_ms() -> u64 {
    500
}

/// Returns the default countdown tick (1000ms).
pub fn default_tick_ms() -> u64 {
    1000
}

pub fn default_server_sync() -> bool {
    true
}

/// Returns the default env var holding the bearer token.
pub fn default_token_env() -> String {
    "ARBIWATCH_TOKEN".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            credential_poll_ms: default_credential_poll_ms(),
            tick_ms: default_tick_ms(),
            server_sync: default_server_sync(),
        }
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            token_file: None,
        }
    }
}
