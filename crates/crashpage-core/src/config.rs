//! Reporter configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::excerpt::DEFAULT_EXCERPT_LINES;
use crate::paths::AppPaths;

/// Settings for the error reporter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Raw display-errors setting, e.g. `"off"` or `"1"`
    #[serde(default = "default_display_errors")]
    pub display_errors: String,

    /// Root of the error templates; `cli/` and `html/` live below it
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Directory relative failure paths are resolved against when reading
    /// source excerpts
    #[serde(default)]
    pub source_root: Option<PathBuf>,

    /// Path prefixes redacted in displayed file names
    #[serde(default)]
    pub paths: AppPaths,

    /// Number of source lines shown around the failing line
    #[serde(default = "default_excerpt_lines")]
    pub excerpt_lines: usize,

    /// Colour the command-line report
    #[serde(default = "default_use_colors")]
    pub use_colors: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            display_errors: default_display_errors(),
            template_dir: default_template_dir(),
            source_root: None,
            paths: AppPaths::default(),
            excerpt_lines: default_excerpt_lines(),
            use_colors: default_use_colors(),
        }
    }
}

impl ReporterConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ReportError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Where to read the source of `file` from
    pub fn source_path(&self, file: &Path) -> PathBuf {
        match &self.source_root {
            Some(root) if file.is_relative() => root.join(file),
            _ => file.to_path_buf(),
        }
    }
}

fn default_display_errors() -> String {
    "off".to_string()
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("views").join("errors")
}

fn default_excerpt_lines() -> usize {
    DEFAULT_EXCERPT_LINES
}

fn default_use_colors() -> bool {
    true
}
