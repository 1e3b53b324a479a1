use std::process::ExitCode;

fn main() -> ExitCode {
    tickerbot_cli::run()
}
