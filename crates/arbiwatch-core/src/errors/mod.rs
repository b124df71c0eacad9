use std::error::Error;

/// Base trait for all application errors
pub trait ArbiwatchError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidOverride {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ArbiwatchError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ReadFailed { .. } => "CONFIG_READ_FAILED",
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidOverride { .. } => "CONFIG_INVALID_OVERRIDE",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
        }
    }

    fn is_user_error(&self) -> bool {
        !matches!(self, ConfigError::ReadFailed { .. })
    }
}
