//! `cortex-harness devices`: descriptor listing, description and validation.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cortex_devices::parse::{device_to_toml, generate_template, parse_device_toml, validate_device};
use cortex_devices::{features, DeviceDescriptor, DeviceRegistry};

use super::{to_json, Format};

/// List every registered device.
pub fn list(registry: &DeviceRegistry, format: Format) -> Result<String> {
    if format == Format::Json {
        let devices: Vec<&DeviceDescriptor> = registry.iter().collect();
        return to_json(&devices);
    }

    let mut out = String::new();
    writeln!(out, "Devices:")?;
    writeln!(out)?;
    for d in registry.iter() {
        writeln!(
            out,
            "  {:<12} {:<15} {:<22} {}",
            d.id,
            d.mcpu,
            d.triple,
            capabilities(d)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Use 'cortex-harness devices describe <id>' for details.")?;
    Ok(out)
}

/// Describe one device as text, TOML or JSON.
pub fn describe(registry: &DeviceRegistry, id: &str, format: Option<&str>) -> Result<String> {
    let d = registry
        .lookup(id)
        .with_context(|| "use 'cortex-harness devices list' to see available devices")?;

    match format {
        Some("toml") => return Ok(device_to_toml(d)?),
        Some("json") => return to_json(d),
        None | Some("text") => {}
        Some(other) => bail!("unknown format '{other}' (expected 'text', 'toml' or 'json')"),
    }

    let mut out = String::new();
    writeln!(out, "=== Device: {} ===", d.id)?;
    writeln!(out)?;
    writeln!(out, "--- Architecture ---")?;
    writeln!(out, "  Family: {}", d.arch)?;
    writeln!(out, "  Triple: {}", d.triple)?;
    writeln!(out, "  ABI:    {}", d.abi)?;
    writeln!(out)?;
    writeln!(out, "--- Core ---")?;
    writeln!(out, "  CPU:    {}", d.mcpu)?;
    writeln!(out, "  FPU:    {}", d.fpu.as_deref().unwrap_or("none"))?;
    writeln!(out, "  MPU:    {}", if d.mpu { "present" } else { "absent" })?;
    writeln!(out, "  Header: {}", d.header)?;
    writeln!(out)?;
    writeln!(out, "--- Features ---")?;
    let feature_set = features(d);
    let tags: Vec<&str> = feature_set.iter().collect();
    writeln!(out, "  {}", tags.join(", "))?;
    writeln!(out)?;
    writeln!(out, "--- Defines ---")?;
    for (name, value) in &d.defines {
        writeln!(out, "  {name} = {value}")?;
    }
    Ok(out)
}

/// Check a `.device.toml` file, reporting every issue.
///
/// Warnings are reported but only errors fail the command.
pub fn validate(path: &Path) -> Result<String> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let descriptor =
        parse_device_toml(&content).with_context(|| format!("parsing {}", path.display()))?;

    let issues = validate_device(&descriptor).err().unwrap_or_default();
    let errors = issues.iter().filter(|i| i.is_error()).count();

    let mut out = String::new();
    for issue in &issues {
        writeln!(out, "  {}: {}", issue.severity, issue.message)?;
    }
    if errors > 0 {
        bail!("{}: {errors} error(s)\n{}", path.display(), out.trim_end());
    }
    writeln!(
        out,
        "{}: device '{}' is valid ({} warning(s))",
        path.display(),
        descriptor.id,
        issues.len()
    )?;
    Ok(out)
}

/// A starter `.device.toml` for a new device.
pub fn template(id: &str) -> Result<String> {
    Ok(generate_template(id)?)
}

fn capabilities(d: &DeviceDescriptor) -> String {
    let mut caps = Vec::new();
    if d.mpu {
        caps.push("mpu");
    }
    if let Some(fpu) = &d.fpu {
        caps.push(fpu.as_str());
    }
    caps.join(" ")
}
