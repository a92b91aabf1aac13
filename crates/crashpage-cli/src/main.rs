//! Crashpage CLI
//!
//! Entry point of the `crashpage` binary: source excerpts, a failing demo
//! command reported through the interactive runner, and the demo server.

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Handle version flag first
    if cli.version {
        commands::version::execute()?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Some(Commands::Version) => {
            commands::version::execute()?;
        }
        Some(Commands::Excerpt { ref file, line, lines }) => {
            let config = commands::load_config(&cli)?;
            commands::excerpt::execute(&config.reporter, file, line, lines)?;
        }
        Some(Commands::Demo { panic, ref message }) => {
            let config = commands::load_config(&cli)?;
            return Ok(commands::demo::execute(config.reporter, panic, message));
        }
        Some(Commands::Serve { port, ref host }) => {
            let mut config = commands::load_config(&cli)?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host.clone_from(host);
            }
            commands::serve::start(config).await?;
        }
        None => {
            println!("{}", "Crashpage uncaught-error reporter".bright_blue().bold());
            println!("Try 'crashpage --help' for more information.");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize logging/tracing based on verbosity level
fn init_logging(verbose: u8) {
    let filter_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Reports go to stdout; keep the log on stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
