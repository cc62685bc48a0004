//! `cortex-harness gate`: which devices a test source applies to.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cortex_devices::{features, DeviceDescriptor, DeviceRegistry, TestGate};
use serde::Serialize;

use super::{to_json, Format};

/// Gate outcome for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub device: String,
    pub applies: bool,
    /// Required tags the device lacks.
    pub missing: Vec<String>,
    /// Unsupported tags the device has.
    pub excluded: Vec<String>,
}

impl Verdict {
    fn new(gate: &TestGate, device: &DeviceDescriptor) -> Self {
        let tags = features(device);
        Verdict {
            device: device.id.clone(),
            applies: gate.applies(&tags),
            missing: gate.missing(&tags).into_iter().map(str::to_string).collect(),
            excluded: gate
                .unsupported
                .iter()
                .filter(|t| tags.contains(t))
                .cloned()
                .collect(),
        }
    }
}

/// Evaluate the directives in `source` against one device, or every device.
pub fn evaluate(source: &str, registry: &DeviceRegistry, device: Option<&str>) -> Result<Vec<Verdict>> {
    let gate = TestGate::parse(source);
    match device {
        Some(id) => Ok(vec![Verdict::new(&gate, registry.lookup(id)?)]),
        None => Ok(registry.iter().map(|d| Verdict::new(&gate, d)).collect()),
    }
}

/// Read `path`, evaluate it and render the verdicts.
///
/// With `check`, a test that applies to none of the evaluated devices is an
/// error, so scripts can branch on the exit status.
pub fn run(
    path: &Path,
    registry: &DeviceRegistry,
    device: Option<&str>,
    check: bool,
    format: Format,
) -> Result<String> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let verdicts = evaluate(&source, registry, device)?;

    let out = match format {
        Format::Json => to_json(&verdicts)?,
        Format::Text => render_text(&verdicts)?,
    };
    if check && !verdicts.iter().any(|v| v.applies) {
        bail!("{} does not apply\n{}", path.display(), out.trim_end());
    }
    Ok(out)
}

fn render_text(verdicts: &[Verdict]) -> Result<String> {
    let mut out = String::new();
    for v in verdicts {
        write!(out, "  {:<12} ", v.device)?;
        if v.applies {
            writeln!(out, "applies")?;
            continue;
        }
        let mut reasons = Vec::new();
        if !v.missing.is_empty() {
            reasons.push(format!("missing: {}", v.missing.join(", ")));
        }
        if !v.excluded.is_empty() {
            reasons.push(format!("unsupported: {}", v.excluded.join(", ")));
        }
        writeln!(out, "skipped ({})", reasons.join("; "))?;
    }
    Ok(out)
}
