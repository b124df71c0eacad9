//! # Configuration System
//!
//! Hierarchical TOML configuration for arbiwatch.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.arbiwatch/config.toml`
//! 3. **Project config** - `./.arbiwatch/config.toml`
//! 4. **Environment** - `ARBIWATCH_API_URL`, `ARBIWATCH_REFRESH_INTERVAL_SECS`
//! 5. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use arbiwatch_core::config::ArbiwatchConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ArbiwatchConfig::load_hierarchy()?;
//!     println!("polling {}", config.api.base_url);
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{ApiConfig, ArbiwatchConfig, CredentialConfig, RefreshConfig};
pub use validation::validate_config;

impl ArbiwatchConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
