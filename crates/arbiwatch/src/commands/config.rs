use clap::ArgMatches;
use tracing::info;

use super::helpers::effective_config;

pub fn handle_config_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.config_started");

    let config = effective_config(matches)?;
    print!("{}", toml::to_string_pretty(&config)?);

    info!(event = "cli.config_completed");
    Ok(())
}
