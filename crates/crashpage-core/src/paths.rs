//! Path redaction for displayed file names

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Well-known roots replaced by symbolic tokens in reports, so pages do not
/// leak the deployment layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPaths {
    /// Application sources, shown as `APPPATH/`
    #[serde(default)]
    pub app_path: Option<PathBuf>,
    /// Framework and dependency sources, shown as `BASEPATH/`
    #[serde(default)]
    pub base_path: Option<PathBuf>,
    /// Toolchain sources, shown as `SYSDIR/`
    #[serde(default)]
    pub sys_dir: Option<PathBuf>,
    /// Public front-controller root, shown as `FCPATH/`
    #[serde(default)]
    pub fc_path: Option<PathBuf>,
}

impl AppPaths {
    /// Roots for a process started from `app_path`: dependency sources under
    /// `$CARGO_HOME/registry/src` and toolchain sources under `/rustc`.
    pub fn for_app(app_path: impl Into<PathBuf>) -> Self {
        let cargo_home = std::env::var_os("CARGO_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cargo")));

        Self {
            app_path: Some(app_path.into()),
            base_path: cargo_home.map(|home| home.join("registry").join("src")),
            sys_dir: Some(PathBuf::from("/rustc")),
            fc_path: None,
        }
    }

    /// Rewrite `file` relative to the first root it lives under.
    ///
    /// Roots are checked in order: application, base, system, front
    /// controller. Files outside every root are returned unchanged.
    pub fn clean_path(&self, file: &Path) -> String {
        let roots = [
            (&self.app_path, "APPPATH"),
            (&self.base_path, "BASEPATH"),
            (&self.sys_dir, "SYSDIR"),
            (&self.fc_path, "FCPATH"),
        ];

        for (root, token) in roots {
            let Some(root) = root else { continue };
            if let Ok(rest) = file.strip_prefix(root) {
                return format!("{token}/{}", rest.display());
            }
        }

        file.display().to_string()
    }
}
