use clap::ArgMatches;
use tracing::{error, info};

use arbiwatch_core::Dashboard;

use super::helpers::effective_config;
use crate::table;

pub async fn handle_fetch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = effective_config(matches)?;

    info!(event = "cli.fetch_started", base_url = %config.api.base_url);

    let dashboard = Dashboard::from_config(&config)?;
    let outcome = dashboard.force_refresh().await;
    let snapshot = dashboard.snapshot();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        table::print_snapshot(&snapshot);
    }

    if let Some(message) = &snapshot.error {
        eprintln!("❌ Refresh failed: {}", message);
        error!(event = "cli.fetch_failed", error = %message);
        return Err(message.clone().into());
    }

    info!(
        event = "cli.fetch_completed",
        outcome = ?outcome,
        pairs = snapshot.pair_data.len(),
        tracked = snapshot.track_data.len(),
        sentiment = snapshot.sentiment_data.len()
    );
    Ok(())
}
