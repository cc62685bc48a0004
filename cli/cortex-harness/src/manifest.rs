//! `harness.toml` parsing and project configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use cortex_devices::parse::DEVICES_DIR;
use cortex_periph::MachineConfig;
use cortex_toolchain::flags::{DEFAULT_INCLUDE_ROOT, DEFAULT_STD};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// File name searched for by [`HarnessManifest::find_and_load`].
pub const MANIFEST_FILE: &str = "harness.toml";

/// The top-level manifest structure for a harness project.
///
/// Every section and every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HarnessManifest {
    /// Build parameters used when the command line leaves them out.
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Project-relative locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Compiler settings that do not depend on the device.
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Peripheral placement for `emulate`.
    #[serde(default)]
    pub machine: MachineConfig,
    /// Console logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultsConfig {
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub toolchain: Option<String>,
    #[serde(default)]
    pub optimize: Option<String>,
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsConfig {
    /// Shared header root passed to `-I`. Kept as written, not made absolute.
    #[serde(default)]
    pub include_root: Option<PathBuf>,
    /// Directory holding custom `.device.toml` files.
    #[serde(default)]
    pub devices_dir: Option<PathBuf>,
}

/// `[compiler]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompilerConfig {
    /// Language standard passed to `-std=`.
    #[serde(default)]
    pub std: Option<String>,
}

/// `[log]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default)]
    pub level: Option<String>,
}

impl HarnessManifest {
    /// Search upward from `start_dir` for a `harness.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: HarnessManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing harness.toml")
    }

    /// Include root, falling back to `include`.
    pub fn include_root(&self) -> PathBuf {
        self.paths
            .include_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INCLUDE_ROOT))
    }

    /// Directory of custom descriptors, resolved against `project_dir`.
    pub fn devices_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.paths.devices_dir.as_deref().unwrap_or(Path::new(DEVICES_DIR)))
    }

    /// Language standard, falling back to `c++20`.
    pub fn std(&self) -> &str {
        self.compiler.std.as_deref().unwrap_or(DEFAULT_STD)
    }

    /// Configured log level, if any.
    pub fn log_level(&self) -> Result<Option<LevelFilter>> {
        self.log
            .level
            .as_deref()
            .map(|level| {
                LevelFilter::from_str(level)
                    .map_err(|_| anyhow!("invalid [log] level '{level}' in {MANIFEST_FILE}"))
            })
            .transpose()
    }

    /// Generate the default template for `cortex-harness init`.
    pub fn template() -> String {
        r#"[defaults]
device = "CM0"
toolchain = "GCC"
optimize = "none"

[paths]
include-root = "include"
devices-dir = "devices"

[compiler]
std = "c++20"

[machine]
output-base = 0x40000000
completion-base = 0x40001000
output-level = "info"

[log]
level = "info"
"#
        .to_string()
    }
}
