//! `cortex-harness subst`: lit substitutions for one build configuration.

use std::fmt::Write as _;

use anyhow::Result;
use cortex_toolchain::Substitutions;

use super::flags::Derived;
use super::{to_json, Format};

/// Render the substitution table, or expand `line` with it.
pub fn render(derived: &Derived<'_>, expand: Option<&str>, format: Format) -> Result<String> {
    let subs = Substitutions::new(derived.device, &derived.invocation, derived.optimization);

    if let Some(line) = expand {
        return Ok(format!("{}\n", subs.expand(line)));
    }
    match format {
        Format::Json => to_json(&subs),
        Format::Text => {
            let mut out = String::new();
            for (key, value) in subs.iter() {
                writeln!(out, "{key:<12} {value}")?;
            }
            Ok(out)
        }
    }
}
