//! `breathcycle` - guided breathing sessions in the terminal

use clap::Parser;

use breathcycle::cli::args::Cli;
use breathcycle::cli::commands::{self, shutdown_signal};
use breathcycle::error::ExitCode;
use breathcycle::observability::{EndReason, LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(LogFormat::Human, cli.verbose, cli.color);
    }

    // The running command handles the first signal; a second one forces exit.
    tokio::spawn(async {
        shutdown_signal().await;
        let code = match shutdown_signal().await {
            EndReason::Terminated => ExitCode::TERMINATED,
            _ => ExitCode::INTERRUPTED,
        };
        std::process::exit(code);
    });

    match commands::dispatch(cli).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
