//! Per-error rendering context

use std::fmt;
use std::path::PathBuf;

use crate::config::ReporterConfig;

/// Values of the display-errors setting that turn detailed reports off.
/// Order matters: each token is removed from what the previous left.
const DISABLING_TOKENS: [&str; 5] = ["off", "none", "no", "false", "null"];

/// Where the failing code was running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Command line; reports are plain text on stdout
    Interactive,
    /// Serving a network request; reports are HTML response bodies
    Networked,
}

impl ExecutionMode {
    /// Template subdirectory for this mode
    pub fn template_dir(self) -> &'static str {
        match self {
            ExecutionMode::Interactive => "cli",
            ExecutionMode::Networked => "html",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_dir())
    }
}

/// Everything the templates need besides the error itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Terminal or network request
    pub mode: ExecutionMode,
    /// Whether the detailed page is shown
    pub display_errors: bool,
    /// Root the template ids are resolved against
    pub template_dir: PathBuf,
}

impl RenderContext {
    /// Resolve the context for one error from the current configuration
    pub fn resolve(config: &ReporterConfig, mode: ExecutionMode) -> Self {
        Self {
            mode,
            display_errors: display_errors_enabled(&config.display_errors),
            template_dir: config.template_dir.clone(),
        }
    }
}

/// Decide whether a display-errors setting asks for detailed reports.
///
/// Every case-insensitive occurrence of `off`, `none`, `no`, `false` and
/// `null` is removed in turn; the setting is "on" only if something is left.
pub fn display_errors_enabled(setting: &str) -> bool {
    let remainder = DISABLING_TOKENS
        .iter()
        .fold(setting.to_string(), |acc, token| remove_ignore_case(&acc, token));
    !remainder.is_empty()
}

/// Remove every non-overlapping ASCII case-insensitive match of `needle`.
fn remove_ignore_case(haystack: &str, needle: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `haystack`.
    let lowered = haystack.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;

    for (idx, matched) in lowered.match_indices(needle) {
        out.push_str(&haystack[last..idx]);
        last = idx + matched.len();
    }
    out.push_str(&haystack[last..]);
    out
}

/// The request that was being served when the error escaped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// HTTP method, e.g. `GET`
    pub method: String,
    /// Request target as received
    pub uri: String,
    /// Header names and values in arrival order
    pub headers: Vec<(String, String)>,
}
