//! `cortex-harness features`: capability tags of a device.

use std::fmt::Write as _;

use anyhow::Result;
use cortex_devices::{features, DeviceRegistry};

use super::{to_json, Format};

/// Tags for `id`, one per line in text form.
pub fn render(registry: &DeviceRegistry, id: &str, format: Format) -> Result<String> {
    let tags = features(registry.lookup(id)?);
    match format {
        Format::Json => to_json(&tags),
        Format::Text => {
            let mut out = String::new();
            for tag in tags.iter() {
                writeln!(out, "{tag}")?;
            }
            Ok(out)
        }
    }
}
