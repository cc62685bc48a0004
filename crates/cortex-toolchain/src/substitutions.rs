//! lit substitution table.
//!
//! Test sources carry RUN lines such as
//! `%cc% %ccflags% %ccout% %t.o %s; objdump --mcpu=%mcpu% ... --check-prefixes %prefixes% %s`.
//! [`Substitutions`] provides the values for the harness-owned placeholders.

use cortex_devices::DeviceDescriptor;
use serde::Serialize;

use crate::flags::CompilerInvocation;
use crate::optimization::OptimizationLevel;

/// Ordered `%name%` → value pairs for one build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Substitutions {
    entries: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new(
        descriptor: &DeviceDescriptor,
        invocation: &CompilerInvocation,
        optimization: OptimizationLevel,
    ) -> Self {
        let entries = vec![
            ("%cc%".to_string(), invocation.executable().display().to_string()),
            ("%ccflags%".to_string(), invocation.flags_line()),
            ("%ccout%".to_string(), "-o".to_string()),
            ("%mcpu%".to_string(), descriptor.mcpu.clone()),
            ("%triple%".to_string(), descriptor.triple.clone()),
            (
                "%prefixes%".to_string(),
                format!("CHECK,{}-CHECK", optimization.check_prefix()),
            ),
        ];
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand every known placeholder in a RUN line.
    pub fn expand(&self, line: &str) -> String {
        self.entries
            .iter()
            .fold(line.to_string(), |acc, (k, v)| acc.replace(k.as_str(), v))
    }
}
