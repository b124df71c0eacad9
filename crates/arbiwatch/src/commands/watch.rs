use std::io::{self, Write};

use chrono::{DateTime, Utc};
use clap::ArgMatches;
use tokio::sync::mpsc;
use tracing::{error, info};

use arbiwatch_core::{Dashboard, Snapshot, events};

use super::helpers::effective_config;
use crate::table;

pub async fn handle_watch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = effective_config(matches)?;

    info!(
        event = "cli.watch.started",
        base_url = %config.api.base_url,
        interval_secs = config.refresh.interval_secs,
        server_sync = config.refresh.server_sync
    );

    let mut dashboard = Dashboard::from_config(&config)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Snapshot>();
    let _subscription = dashboard.subscribe(move |snapshot| {
        let _ = tx.send(snapshot.clone());
    });

    if let Err(e) = dashboard.start() {
        eprintln!("❌ Failed to start refresh scheduler: {}", e);
        error!(event = "cli.watch.start_failed", error = %e);
        events::log_app_error(&e);
        return Err(e.into());
    }

    if !json_output {
        println!(
            "Watching {} every {}s. Press Ctrl+C to exit.",
            config.api.base_url, config.refresh.interval_secs
        );
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut renderer = Renderer::new(json_output);
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!(event = "cli.watch.signal_failed", error = %e);
                }
                break;
            }
            Some(snapshot) = rx.recv() => renderer.render(&snapshot)?,
        }
    }

    dashboard.stop().await;
    if !json_output {
        println!();
    }
    info!(event = "cli.watch.stopped");
    Ok(())
}

/// Prints a full snapshot after each commit and a countdown line in between.
struct Renderer {
    json_output: bool,
    last_refresh_at: Option<DateTime<Utc>>,
    last_countdown: Option<u64>,
    loading: bool,
}

impl Renderer {
    fn new(json_output: bool) -> Self {
        Self {
            json_output,
            last_refresh_at: None,
            last_countdown: None,
            loading: false,
        }
    }

    fn render(&mut self, snapshot: &Snapshot) -> Result<(), Box<dyn std::error::Error>> {
        if snapshot.loading && !self.loading && !self.json_output {
            println!("\nFetching latest signals...");
        }
        self.loading = snapshot.loading;

        if snapshot.last_refresh_at != self.last_refresh_at {
            self.last_refresh_at = snapshot.last_refresh_at;
            self.last_countdown = None;

            if self.json_output {
                println!("{}", serde_json::to_string(snapshot)?);
            } else {
                table::print_snapshot(snapshot);
                if let Some(message) = &snapshot.error {
                    eprintln!("⚠️  Partial refresh: {}", message);
                }
            }
            return Ok(());
        }

        if self.json_output || snapshot.loading || snapshot.next_refresh_at.is_none() {
            return Ok(());
        }

        if self.last_countdown != Some(snapshot.countdown_seconds) {
            self.last_countdown = Some(snapshot.countdown_seconds);
            print!("\rNext refresh in: {}   ", snapshot.countdown_label());
            io::stdout().flush()?;
        }
        Ok(())
    }
}
