//! Command-line interface definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Crashpage CLI
#[derive(Parser, Debug)]
#[command(name = "crashpage")]
#[command(version)]
#[command(disable_version_flag = true)]
#[command(about = "Render uncaught-error reports and source excerpts")]
#[command(long_about = "
Crashpage renders last-resort error reports: a plain text report on the
command line, an HTML page for network requests.

The display-errors setting decides between the detailed report and the
generic one. It is read from the configuration file and can be overridden
with --display-errors or the DISPLAY_ERRORS environment variable.
")]
pub struct Cli {
    /// Display version information
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// Increase verbosity (can be used multiple times)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (YAML format)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Display-errors setting, e.g. "off" or "1"
    #[arg(long, env = "DISPLAY_ERRORS", global = true)]
    pub display_errors: Option<String>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Display version information
    Version,

    /// Print the highlighted source excerpt around a line
    Excerpt {
        /// Source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based line to centre the excerpt on
        #[arg(value_name = "LINE")]
        line: usize,

        /// Number of lines to show
        #[arg(short = 'n', long)]
        lines: Option<usize>,
    },

    /// Fail on purpose and print the resulting report
    Demo {
        /// Panic instead of returning an error
        #[arg(long)]
        panic: bool,

        /// Message carried by the failure
        #[arg(short, long, default_value = "demo command failed")]
        message: String,
    },

    /// Run the demo HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host address to bind to
        #[arg(long)]
        host: Option<String>,
    },
}
