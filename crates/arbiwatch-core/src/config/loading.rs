//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.arbiwatch/config.toml`
//! 3. **Project config** - `./.arbiwatch/config.toml`
//! 4. **Environment** - `ARBIWATCH_API_URL`, `ARBIWATCH_REFRESH_INTERVAL_SECS`
//! 5. **CLI arguments** - Command-line flags (applied by the CLI)
//!
//! Files are merged as TOML tables before deserializing, so a project file
//! that only sets `[refresh] interval_secs` keeps the user's `[api]` section.

use crate::config::types::ArbiwatchConfig;
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_API_URL: &str = "ARBIWATCH_API_URL";
pub const ENV_REFRESH_INTERVAL: &str = "ARBIWATCH_REFRESH_INTERVAL_SECS";

/// Load configuration from the hierarchy of config files and the environment.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed, an
/// environment override is invalid, or validation fails. Missing config files
/// are not errors.
pub fn load_hierarchy() -> Result<ArbiwatchConfig, ConfigError> {
    let user_path = user_config_path();
    let project_path = project_config_path();
    load_from_paths(
        user_path.as_deref(),
        project_path.as_deref(),
        |name| std::env::var(name).ok(),
    )
}

/// Load and merge the given config files, then apply environment overrides.
pub fn load_from_paths(
    user_path: Option<&Path>,
    project_path: Option<&Path>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ArbiwatchConfig, ConfigError> {
    let mut merged = toml::Table::new();

    for path in [user_path, project_path].into_iter().flatten() {
        if let Some(table) = read_config_table(path)? {
            debug!(event = "core.config.file_loaded", path = %path.display());
            merge_tables(&mut merged, table);
        }
    }

    let config: ArbiwatchConfig =
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ConfigParseError {
                path: "<merged>".to_string(),
                message: e.to_string(),
            })?;

    let config = apply_env_overrides(config, env_lookup)?;
    validate_config(&config)?;
    Ok(config)
}

/// Path of the user config file, if a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".arbiwatch").join("config.toml"))
}

/// Path of the project config file in the current directory.
pub fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(".arbiwatch").join("config.toml"))
}

/// Read a config file as a raw TOML table. `Ok(None)` when the file does not exist.
fn read_config_table(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            });
        }
    };

    let table: toml::Table =
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(Some(table))
}

/// Deep-merge `overlay` into `base`. Nested tables merge key by key; any
/// other value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides on top of file configuration.
pub fn apply_env_overrides(
    mut config: ArbiwatchConfig,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ArbiwatchConfig, ConfigError> {
    if let Some(url) = env_lookup(ENV_API_URL)
        && !url.trim().is_empty()
    {
        config.api.base_url = url.trim().to_string();
    }

    if let Some(raw) = env_lookup(ENV_REFRESH_INTERVAL) {
        config.refresh.interval_secs =
            raw.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidOverride {
                    name: ENV_REFRESH_INTERVAL.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
    }

    Ok(config)
}
