//! `cortex-harness doctor`: toolchain and project diagnostics.

use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use cortex_toolchain::resolve::fallback_variables;
use cortex_toolchain::{RootRequirement, ToolchainKind, ToolchainProfile};

use crate::manifest::{HarnessManifest, MANIFEST_FILE};

/// Diagnostic report on toolchains, the manifest and custom devices.
pub fn run(
    project_dir: &Path,
    locate: impl Fn(ToolchainKind) -> ToolchainProfile,
) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "=== Cortex Harness Doctor ===")?;
    writeln!(out)?;
    writeln!(out, "Harness version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out)?;

    writeln!(out, "--- Toolchains ---")?;
    for kind in ToolchainKind::ALL {
        let profile = locate(kind);
        match profile.resolved() {
            Some(root) => writeln!(
                out,
                "  {:<6} {} (from {})",
                kind.name(),
                root.path.display(),
                root.source
            )?,
            None => writeln!(
                out,
                "  {:<6} not configured (set {}_TOOLCHAIN_<VERSION> or one of: {})",
                kind.name(),
                kind.name(),
                fallback_variables(kind.name()).join(", ")
            )?,
        }
        if let Ok(executable) = profile.executable(RootRequirement::SearchPath) {
            writeln!(out, "         {}", tool_status(&executable, &["--version"]))?;
        }
    }
    writeln!(out)?;

    writeln!(out, "--- Project Status ---")?;
    match HarnessManifest::find_and_load(project_dir) {
        Ok(Some((manifest, dir))) => {
            writeln!(out, "  {MANIFEST_FILE}: found at {}", dir.display())?;
            let devices_dir = manifest.devices_dir(&dir);
            match super::load_registry(&dir, &manifest) {
                Ok(registry) => writeln!(
                    out,
                    "  Devices: {} ({} from {})",
                    registry.len(),
                    registry.len() - cortex_devices::DeviceRegistry::builtin().len(),
                    devices_dir.display()
                )?,
                Err(e) => writeln!(out, "  Devices: error: {e:#}")?,
            }
            writeln!(out, "  Include root: {}", manifest.include_root().display())?;
        }
        Ok(None) => writeln!(out, "  {MANIFEST_FILE}: not found")?,
        Err(e) => writeln!(out, "  {MANIFEST_FILE}: error: {e:#}")?,
    }

    Ok(out)
}

fn tool_status(executable: &Path, args: &[&str]) -> String {
    match Command::new(executable).args(args).output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first_line = version.lines().next().unwrap_or("(unknown version)");
            format!("{}: {first_line}", executable.display())
        }
        Err(_) => format!("{}: not found", executable.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn doctor_runs_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(dir.path(), |kind| {
            ToolchainProfile::from_vars(kind, env(&[("GCC_TOOLCHAIN_13", "/nonexistent/gcc")]))
        })
        .unwrap();
        assert!(out.contains("GCC    /nonexistent/gcc (from $GCC_TOOLCHAIN_13)"));
        assert!(out.contains("/nonexistent/gcc/bin/arm-none-eabi-g++: not found"));
        assert!(out.contains("CLANG  not configured"));
        assert!(out.contains("LLVM_PATH, CLANG_PATH"));
    }

    #[test]
    fn doctor_reports_project_devices() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[paths]\ndevices-dir = \"boards\"\n").unwrap();
        std::fs::create_dir_all(dir.path().join("boards")).unwrap();
        std::fs::write(
            dir.path().join("boards/x.device.toml"),
            cortex_devices::parse::generate_template("X").unwrap(),
        )
        .unwrap();

        let out = run(dir.path(), |kind| ToolchainProfile::from_vars(kind, Vec::new())).unwrap();
        assert!(out.contains("harness.toml: found"));
        assert!(out.contains("Devices: 5 (1 from"));
    }
}
