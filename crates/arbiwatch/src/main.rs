use arbiwatch_core::init_logging;

mod app;
mod commands;
mod table;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = app::build_cli();
    let matches = app.get_matches();

    // Logs stay quiet unless -v is given
    let verbose = matches.get_flag("verbose");
    init_logging(!verbose);

    commands::run_command(&matches).await?;

    Ok(())
}
