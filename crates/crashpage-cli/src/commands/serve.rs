//! Serve command - delegates to crashpage-server crate

use anyhow::Result;
use colored::Colorize;
use crashpage_core::display_errors_enabled;
use crashpage_server::{run_server, ServerConfig};

/// Start the demo HTTP server
pub async fn start(config: ServerConfig) -> Result<()> {
    println!("{}", "Starting crashpage demo server".bright_blue().bold());

    let details = if display_errors_enabled(&config.reporter.display_errors) {
        "detailed"
    } else {
        "generic"
    };
    println!("{}: http://{}:{}", "Address".bright_cyan(), config.host, config.port);
    println!("{}: {}", "Error pages".bright_cyan(), details);

    println!();
    println!("{}", "Endpoints:".bright_green());
    println!("  GET  /        - Index");
    println!("  GET  /health  - Health check");
    println!("  GET  /panic   - Handler that panics");
    println!("  GET  /fail    - Handler that returns an error");
    println!();

    run_server(config).await
}
