use clap::ArgMatches;
use tracing::{error, warn};

use arbiwatch_core::config::ArbiwatchConfig;
use arbiwatch_core::events;
use arbiwatch_core::errors::ConfigError;

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
pub fn load_config_with_warning() -> ArbiwatchConfig {
    match ArbiwatchConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.arbiwatch/config.toml and ./.arbiwatch/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            ArbiwatchConfig::default()
        }
    }
}

/// Apply the flags a subcommand accepts on top of `config`, then validate.
///
/// Flags a subcommand does not define are skipped.
pub fn apply_cli_overrides(
    mut config: ArbiwatchConfig,
    matches: &ArgMatches,
) -> Result<ArbiwatchConfig, ConfigError> {
    if let Ok(Some(url)) = matches.try_get_one::<String>("api-url") {
        config.api.base_url = url.clone();
    }
    if let Ok(Some(interval)) = matches.try_get_one::<u64>("interval") {
        config.refresh.interval_secs = *interval;
        // Keep the tick within the interval so short intervals still validate.
        config.refresh.tick_ms = config.refresh.tick_ms.min(interval.saturating_mul(1000));
    }
    if let Ok(Some(&true)) = matches.try_get_one::<bool>("no-server-sync") {
        config.refresh.server_sync = false;
    }

    config.validate()?;
    Ok(config)
}

/// Configuration for a command: file hierarchy, environment, then flags.
///
/// An invalid result is reported on stderr before it is returned.
pub fn effective_config(matches: &ArgMatches) -> Result<ArbiwatchConfig, ConfigError> {
    apply_cli_overrides(load_config_with_warning(), matches).inspect_err(|e| {
        eprintln!("❌ Invalid configuration: {}", e);
        error!(event = "cli.config.invalid", error = %e);
        events::log_app_error(e);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_cli;

    fn sub_matches(args: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(args).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        sub.clone()
    }

    #[test]
    fn test_overrides_applied() {
        let matches = sub_matches(&[
            "arbiwatch",
            "watch",
            "--interval",
            "30",
            "--api-url",
            "https://signals.example.com",
            "--no-server-sync",
        ]);

        let config = apply_cli_overrides(ArbiwatchConfig::default(), &matches).unwrap();
        assert_eq!(config.refresh.interval_secs, 30);
        assert_eq!(config.api.base_url, "https://signals.example.com");
        assert!(!config.refresh.server_sync);
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let matches = sub_matches(&["arbiwatch", "fetch"]);
        let config = apply_cli_overrides(ArbiwatchConfig::default(), &matches).unwrap();
        assert_eq!(config, ArbiwatchConfig::default());
    }

    #[test]
    fn test_invalid_url_override_rejected() {
        let matches = sub_matches(&["arbiwatch", "fetch", "--api-url", "ftp://nope"]);
        assert!(apply_cli_overrides(ArbiwatchConfig::default(), &matches).is_err());
    }

    #[test]
    fn test_config_subcommand_has_no_overrides() {
        let matches = sub_matches(&["arbiwatch", "config"]);
        let config = apply_cli_overrides(ArbiwatchConfig::default(), &matches).unwrap();
        assert!(config.refresh.server_sync);
    }
}
