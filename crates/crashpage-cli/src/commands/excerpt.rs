//! Excerpt command - prints the highlighted window around a source line

use anyhow::{bail, Result};
use crashpage_core::{highlight_file, ReporterConfig};
use std::path::Path;

/// Print the excerpt fragment for `line` of `file`
pub fn execute(config: &ReporterConfig, file: &Path, line: usize, lines: Option<usize>) -> Result<()> {
    let lines = lines.unwrap_or(config.excerpt_lines);

    match highlight_file(file, line, lines) {
        Some(fragment) => {
            println!("{fragment}");
            Ok(())
        }
        None => bail!("No source excerpt available for {}", file.display()),
    }
}
