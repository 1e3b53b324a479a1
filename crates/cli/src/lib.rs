pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tickerbot",
    about = "Tickerbot operator CLI",
    long_about = "Inspect configuration, check readiness, and preview quote replies without going through LINE.",
    after_help = "Examples:\n  tickerbot doctor --json\n  tickerbot config\n  tickerbot lookup 2330,0050"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and probe the quote provider")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the reply a chat user would receive for a message")]
    Lookup {
        #[arg(help = "Message text, for example `2330` or `2330,0050`")]
        text: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Lookup { text } => commands::lookup::run(&text),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
