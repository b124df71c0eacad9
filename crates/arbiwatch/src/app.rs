use clap::{Arg, ArgAction, Command, value_parser};

fn api_url_arg() -> Arg {
    Arg::new("api-url")
        .long("api-url")
        .help("Base URL of the signal API (overrides config)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

pub fn build_cli() -> Command {
    Command::new("arbiwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch cross-exchange arbitrage signals")
        .long_about("arbiwatch polls an arbitrage signal API on a fixed cadence, merges pair spreads, tracked best-exchange pairs and market sentiment into one snapshot, and prints it with a countdown to the next refresh.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("watch")
                .about("Refresh on a schedule and print each snapshot until Ctrl+C")
                .arg(json_arg())
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .short('i')
                        .help("Seconds between refreshes (overrides config)")
                        .value_parser(value_parser!(u64).range(1..)),
                )
                .arg(api_url_arg())
                .arg(
                    Arg::new("no-server-sync")
                        .long("no-server-sync")
                        .help("Ignore the server-reported next refresh time")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("fetch")
                .about("Run one refresh cycle and print the snapshot")
                .arg(json_arg())
                .arg(api_url_arg()),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}
