//! Command implementations

pub mod demo;
pub mod excerpt;
pub mod serve;
pub mod version;

use anyhow::Result;
use crashpage_core::AppPaths;
use crashpage_server::ServerConfig;

use crate::cli::Cli;

/// Load the configuration file, if any, and apply the global overrides
pub fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_yaml_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(setting) = &cli.display_errors {
        config.reporter.display_errors.clone_from(setting);
    }
    if cli.no_color {
        config.reporter.use_colors = false;
    }
    if config.reporter.paths == AppPaths::default() {
        config.reporter.paths = AppPaths::for_app(std::env::current_dir()?);
    }

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
