use clap::ArgMatches;
use tracing::error;

use arbiwatch_core::events;

pub mod helpers;

mod config;
mod fetch;
mod watch;

pub async fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    let result = match matches.subcommand() {
        Some(("watch", sub_matches)) => watch::handle_watch_command(sub_matches).await,
        Some(("fetch", sub_matches)) => fetch::handle_fetch_command(sub_matches).await,
        Some(("config", sub_matches)) => config::handle_config_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    };

    events::log_app_shutdown();
    result
}
