//! Configuration validation.

use crate::config::types::ArbiwatchConfig;
use crate::errors::ConfigError;

/// Validate a fully merged configuration.
pub fn validate_config(config: &ArbiwatchConfig) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(invalid(format!(
            "api.base_url must start with http:// or https://, got '{}'",
            config.api.base_url
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(invalid("api.timeout_secs must be greater than 0"));
    }

    let refresh = &config.refresh;
    if refresh.interval_secs == 0 {
        return Err(invalid("refresh.interval_secs must be greater than 0"));
    }
    if refresh.credential_poll_ms == 0 {
        return Err(invalid("refresh.credential_poll_ms must be greater than 0"));
    }
    if refresh.tick_ms == 0 {
        return Err(invalid("refresh.tick_ms must be greater than 0"));
    }
    if refresh.tick() > refresh.interval() {
        return Err(invalid(format!(
            "refresh.tick_ms ({}) must not exceed refresh.interval_secs ({}s)",
            refresh.tick_ms, refresh.interval_secs
        )));
    }

    if config.credential.token_env.trim().is_empty() {
        return Err(invalid("credential.token_env must not be empty"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ArbiwatchConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = ArbiwatchConfig::default();
        config.api.base_url = "localhost:8000".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = ArbiwatchConfig::default();
        config.refresh.interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_tick_longer_than_interval() {
        let mut config = ArbiwatchConfig::default();
        config.refresh.interval_secs = 1;
        config.refresh.tick_ms = 1500;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tick_ms"));
    }

    #[test]
    fn test_rejects_blank_token_env() {
        let mut config = ArbiwatchConfig::default();
        config.credential.token_env = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }
}
