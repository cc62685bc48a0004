//! TOML parsing, serialization, validation, and discovery for device descriptors.
//!
//! Custom descriptors are stored as `.device.toml` files in the `devices/`
//! directory of a harness project.

use std::path::{Path, PathBuf};

use crate::descriptor::DeviceDescriptor;
use crate::error::{DeviceError, Result};

/// A validation issue found in a descriptor.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}

/// Load a descriptor from a `.device.toml` file.
pub fn load_device_toml(path: &Path) -> Result<DeviceDescriptor> {
    if !path.exists() {
        return Err(DeviceError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let descriptor = parse_device_toml(&content)?;
    if let Err(issues) = validate_device(&descriptor) {
        if let Some(issue) = issues.iter().find(|i| i.is_error()) {
            return Err(DeviceError::Validation {
                detail: format!("{}: {}", path.display(), issue.message),
            });
        }
    }
    Ok(descriptor)
}

/// Parse a descriptor from a TOML string.
pub fn parse_device_toml(toml_str: &str) -> Result<DeviceDescriptor> {
    let descriptor: DeviceDescriptor = toml::from_str(toml_str)?;
    Ok(descriptor)
}

/// Serialize a descriptor to pretty TOML.
pub fn device_to_toml(descriptor: &DeviceDescriptor) -> Result<String> {
    let toml_str = toml::to_string_pretty(descriptor)?;
    Ok(toml_str)
}

/// Validate a descriptor for structural correctness.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
/// Warnings alone still produce `Err`; callers decide whether to reject.
pub fn validate_device(descriptor: &DeviceDescriptor) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if descriptor.id.trim().is_empty() {
        issues.push(ValidationIssue {
            severity: "error",
            message: "device id is empty".into(),
        });
    }

    if descriptor.mcpu.trim().is_empty() {
        issues.push(ValidationIssue {
            severity: "error",
            message: "mcpu is empty".into(),
        });
    }

    if !descriptor.triple.starts_with(&descriptor.arch) {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!(
                "triple '{}' does not match arch '{}'",
                descriptor.triple, descriptor.arch
            ),
        });
    }

    // The family tag must be advertised so tests can gate on it.
    if !descriptor.declares(&descriptor.arch) {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!("features do not include arch tag '{}'", descriptor.arch),
        });
    }

    for name in descriptor.defines.keys() {
        if !is_c_identifier(name) {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("define '{name}' is not a valid C identifier"),
            });
        }
    }

    if let Some(value) = descriptor.define("__MPU_PRESENT") {
        let declared = value.trim_end_matches(['U', 'u']) != "0";
        if declared != descriptor.mpu {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!(
                    "__MPU_PRESENT={value} contradicts mpu = {}",
                    descriptor.mpu
                ),
            });
        }
    } else if descriptor.mpu {
        issues.push(ValidationIssue {
            severity: "warning",
            message: "mpu = true but __MPU_PRESENT is not defined".into(),
        });
    }

    if descriptor.define("__NVIC_PRIO_BITS").is_none() {
        issues.push(ValidationIssue {
            severity: "warning",
            message: "__NVIC_PRIO_BITS is not defined".into(),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Generate a template `.device.toml` for a new device.
///
/// Seeds from the Cortex-M0 descriptor with the given identifier.
pub fn generate_template(id: &str) -> Result<String> {
    let mut descriptor = DeviceDescriptor::cortex_m0();
    descriptor.id = id.into();
    device_to_toml(&descriptor)
}

/// Directory, relative to a project root, that holds custom descriptors.
pub const DEVICES_DIR: &str = "devices";

/// Discover all `.device.toml` files in a project's `devices/` directory.
///
/// Returns a list of (file stem, file path) pairs sorted by name.
pub fn discover_devices(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    discover_devices_in(&project_dir.join(DEVICES_DIR))
}

/// Discover all `.device.toml` files directly inside `devices_dir`.
///
/// A missing directory yields an empty list.
pub fn discover_devices_in(devices_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !devices_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut devices = Vec::new();
    for entry in std::fs::read_dir(devices_dir)? {
        let path = entry?.path();
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".device.toml"))
            .map(str::to_string);
        if let Some(stem) = stem {
            devices.push((stem, path));
        }
    }
    devices.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(devices)
}
