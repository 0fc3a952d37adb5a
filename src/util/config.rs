//! Configuration file support for avforge.
//!
//! An optional `avforge.toml` in the working directory overrides the
//! default working-tree layout:
//!
//! ```toml
//! [paths]
//! source_dir = "source"
//! build_dir = "build"
//! output_dir = "output"
//!
//! [fetch]
//! jobs = 8
//!
//! [tools]
//! available = ["gperf"]
//! ```
//!
//! The output directory can also be overridden from the environment for
//! containerized builds, see [`Config::output_dir`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::platform::Os;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "avforge.toml";

/// Environment variable that overrides the output directory.
pub const OUTPUT_DIR_ENV: &str = "AVFORGE_OUTPUT_DIR";

/// Set to `1` by cibuildwheel inside its Linux build containers.
pub const CIBUILDWHEEL_ENV: &str = "CIBUILDWHEEL";

/// avforge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Working tree layout
    pub paths: PathsConfig,

    /// Source download settings
    pub fetch: FetchConfig,

    /// Host tool settings
    pub tools: ToolsConfig,
}

/// Working tree layout, relative paths are resolved against the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Downloaded source archives
    pub source_dir: PathBuf,

    /// Extracted sources and out-of-tree build directories
    pub build_dir: PathBuf,

    /// Final tarball location
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            source_dir: PathBuf::from("source"),
            build_dir: PathBuf::from("build"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Source download settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of concurrent downloads (None = available parallelism)
    pub jobs: Option<usize>,
}

/// Host tool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Build tools already installed on the host; these are not built from source
    pub available: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Whether a build tool is already provided by the host.
    ///
    /// Windows CI images ship gperf and nasm through MSYS2, so those count as
    /// available there even when not listed.
    pub fn tool_available(&self, tool: &str, os: Os) -> bool {
        if os == Os::Windows && matches!(tool, "gperf" | "nasm") {
            return true;
        }
        self.tools.available.iter().any(|t| t == tool)
    }

    /// Resolve the output directory.
    ///
    /// Precedence: `AVFORGE_OUTPUT_DIR`, then `/output` when running inside a
    /// cibuildwheel Linux container, then `paths.output_dir` resolved against
    /// `cwd`.
    pub fn output_dir(
        &self,
        os: Os,
        cwd: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> PathBuf {
        if let Some(dir) = env(OUTPUT_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        if os == Os::Linux && env(CIBUILDWHEEL_ENV).as_deref() == Some("1") {
            return PathBuf::from("/output");
        }
        cwd.join(&self.paths.output_dir)
    }
}
