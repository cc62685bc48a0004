//! CLI command implementations.
//!
//! Each command renders its output to a `String` and the dispatcher in
//! `main` prints it, so tests can check what a command would show.

use std::path::Path;

use anyhow::{bail, Context, Result};
use cortex_devices::DeviceRegistry;
use cortex_toolchain::InvocationRequest;
use serde::Serialize;

use crate::manifest::{DefaultsConfig, HarnessManifest};

pub mod devices;
pub mod doctor;
pub mod emulate;
pub mod features;
pub mod flags;
pub mod gate;
pub mod init;
pub mod subst;

/// Output format accepted by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(format: Option<&str>) -> Result<Self> {
        match format {
            None | Some("text") => Ok(Format::Text),
            Some("json") => Ok(Format::Json),
            Some(other) => bail!("unknown format '{other}' (expected 'text' or 'json')"),
        }
    }
}

/// Pretty JSON with a trailing newline.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).context("serializing JSON output")?;
    out.push('\n');
    Ok(out)
}

/// Built-in devices plus the project's custom descriptors.
pub fn load_registry(project_dir: &Path, manifest: &HarnessManifest) -> Result<DeviceRegistry> {
    let devices_dir = manifest.devices_dir(project_dir);
    let builder = DeviceRegistry::builder()
        .load_dir(&devices_dir)
        .with_context(|| format!("loading devices from {}", devices_dir.display()))?;
    Ok(builder.build())
}

/// Fill parameters missing from the command line with manifest defaults.
///
/// Parameters absent from both stay `None` and get the built-in defaults
/// when the request is resolved.
pub fn with_defaults(request: InvocationRequest, defaults: &DefaultsConfig) -> InvocationRequest {
    InvocationRequest {
        device: request.device.or_else(|| defaults.device.clone()),
        toolchain: request.toolchain.or_else(|| defaults.toolchain.clone()),
        optimize: request.optimize.or_else(|| defaults.optimize.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(Format::parse(None).unwrap(), Format::Text);
        assert_eq!(Format::parse(Some("json")).unwrap(), Format::Json);
        assert!(Format::parse(Some("yaml")).is_err());
    }

    #[test]
    fn command_line_beats_manifest() {
        let defaults = DefaultsConfig {
            device: Some("CM3".into()),
            toolchain: Some("CLANG".into()),
            optimize: None,
        };
        let request = InvocationRequest {
            device: Some("CM1".into()),
            ..Default::default()
        };
        let merged = with_defaults(request, &defaults);
        assert_eq!(merged.device.as_deref(), Some("CM1"));
        assert_eq!(merged.toolchain.as_deref(), Some("CLANG"));
        assert_eq!(merged.optimize, None);
    }

    #[test]
    fn registry_includes_project_devices() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("devices")).unwrap();
        let template = cortex_devices::parse::generate_template("CM0-board").unwrap();
        std::fs::write(dir.path().join("devices/board.device.toml"), template).unwrap();

        let registry = load_registry(dir.path(), &HarnessManifest::default()).unwrap();
        assert!(registry.contains("CM0-board"));
        assert!(registry.contains("CM3"));
    }
}
