use claude_config::{cli::Cli, commands, telemetry};
use clap::Parser;
use crossterm::style::Stylize;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = telemetry::init_tracing() {
        eprintln!("{e}");
    }

    if let Err(e) = commands::run(&cli) {
        eprintln!("{} {:#}", "\n✗".red(), e);
        std::process::exit(1);
    }
}
