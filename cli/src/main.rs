mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, expand, scan};
use terminal::{logging, print};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    let log_file = match &commands.command {
        Commands::Scan(args) => args.log_file(),
        Commands::Expand(_) => None,
    };
    if let Err(e) = logging::init(commands.quiet, log_file.as_deref()) {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    print::banner(commands.no_banner, commands.quiet);

    let result = match commands.command {
        Commands::Scan(args) => {
            print::section("getting ready to scan", commands.quiet);
            let cfg = args.to_config(commands.quiet);
            scan::scan(&args.target, &cfg).await
        }
        Commands::Expand(target) => {
            print::section("expanding targets", commands.quiet);
            expand::expand(&target, commands.quiet)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
