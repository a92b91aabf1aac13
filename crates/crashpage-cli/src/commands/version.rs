//! Version command implementation

use anyhow::Result;
use colored::Colorize;

/// Display version information
pub fn execute() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
    const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

    println!("{}", "Crashpage".bright_blue().bold());
    println!("{}: {}", "Version".bright_cyan(), VERSION);
    println!("{}: {}", "Core".bright_cyan(), crashpage_core::VERSION);
    println!("{}: {}", "Authors".bright_cyan(), AUTHORS);
    println!();
    println!("{}", DESCRIPTION.dimmed());

    Ok(())
}
