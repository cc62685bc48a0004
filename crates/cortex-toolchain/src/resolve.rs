//! Toolchain root discovery from environment variables.
//!
//! Build machines name their toolchain variables inconsistently, so lookup
//! happens in two tiers:
//!
//! 1. Variables named `{TOOLCHAIN}_TOOLCHAIN_*` (e.g. `GCC_TOOLCHAIN_13_2`).
//!    When several exist, the lexicographically greatest name wins.
//! 2. A fixed list of legacy names per toolchain, first present wins.
//!
//! Finding nothing is not an error here; it only becomes one for callers
//! that insist on a resolved path.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Legacy variable names consulted when no `{TOOLCHAIN}_TOOLCHAIN_*` variable exists.
pub fn fallback_variables(toolchain: &str) -> &'static [&'static str] {
    match toolchain {
        "GCC" => &["ARM_NONE_EABI_GCC_PATH", "GCC_ARM_PATH", "ARM_GCC_PATH"],
        "CLANG" => &["LLVM_PATH", "CLANG_PATH"],
        "AC6" => &["ARMCLANG_PATH", "AC6_PATH"],
        _ => &[],
    }
}

/// Which variable supplied a resolved root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "variable", rename_all = "kebab-case")]
pub enum RootSource {
    /// A `{TOOLCHAIN}_TOOLCHAIN_*` variable.
    Primary(String),
    /// One of the legacy fallback variables.
    Fallback(String),
}

impl RootSource {
    pub fn variable(&self) -> &str {
        match self {
            RootSource::Primary(name) | RootSource::Fallback(name) => name,
        }
    }
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootSource::Primary(name) => write!(f, "${name}"),
            RootSource::Fallback(name) => write!(f, "${name} (fallback)"),
        }
    }
}

/// A toolchain root found in the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoot {
    pub path: PathBuf,
    pub source: RootSource,
}

/// Resolve the root of `toolchain` from an environment snapshot.
pub fn resolve_root<I>(toolchain: &str, vars: I) -> Option<ResolvedRoot>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: BTreeMap<String, String> = vars.into_iter().collect();
    let prefix = format!("{toolchain}_TOOLCHAIN_");

    // Reverse key order: the first match is the greatest name.
    if let Some((name, value)) = vars.iter().rev().find(|(k, _)| k.starts_with(&prefix)) {
        return Some(ResolvedRoot {
            path: PathBuf::from(value),
            source: RootSource::Primary(name.clone()),
        });
    }

    for name in fallback_variables(toolchain) {
        if let Some(value) = vars.get(*name) {
            return Some(ResolvedRoot {
                path: PathBuf::from(value),
                source: RootSource::Fallback((*name).to_string()),
            });
        }
    }

    log::warn!("toolchain '{toolchain}' not found in environment");
    None
}

/// Resolve the root of `toolchain` from the current process environment.
///
/// Variables whose name or value is not valid UTF-8 are ignored.
pub fn resolve_root_from_process(toolchain: &str) -> Option<ResolvedRoot> {
    let vars = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
    resolve_root(toolchain, vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn greatest_primary_name_wins() {
        let root = resolve_root("FOO", env(&[("FOO_TOOLCHAIN_A", "1"), ("FOO_TOOLCHAIN_B", "1")]))
            .unwrap();
        assert_eq!(root.source, RootSource::Primary("FOO_TOOLCHAIN_B".into()));
        assert_eq!(root.path, PathBuf::from("1"));
    }

    #[test]
    fn primary_choice_ignores_insertion_order() {
        let vars = env(&[
            ("GCC_TOOLCHAIN_13_2", "/opt/gcc-13"),
            ("GCC_TOOLCHAIN_10_3", "/opt/gcc-10"),
            ("GCC_TOOLCHAIN_12_1", "/opt/gcc-12"),
        ]);
        let mut reversed = vars.clone();
        reversed.reverse();
        let a = resolve_root("GCC", vars).unwrap();
        let b = resolve_root("GCC", reversed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.path, PathBuf::from("/opt/gcc-13"));
    }

    #[test]
    fn primary_beats_fallback() {
        let root = resolve_root(
            "CLANG",
            env(&[("LLVM_PATH", "/usr/lib/llvm"), ("CLANG_TOOLCHAIN_17", "/opt/llvm-17")]),
        )
        .unwrap();
        assert_eq!(root.path, PathBuf::from("/opt/llvm-17"));
    }

    #[test]
    fn fallback_list_order() {
        let root = resolve_root(
            "GCC",
            env(&[("ARM_GCC_PATH", "/c"), ("GCC_ARM_PATH", "/b")]),
        )
        .unwrap();
        assert_eq!(root.source, RootSource::Fallback("GCC_ARM_PATH".into()));
        assert_eq!(root.path, PathBuf::from("/b"));

        let root = resolve_root("AC6", env(&[("AC6_PATH", "/arm")])).unwrap();
        assert_eq!(root.source.variable(), "AC6_PATH");
    }

    #[test]
    fn other_toolchains_do_not_match() {
        let vars = env(&[("GCC_TOOLCHAIN_13", "/opt/gcc"), ("LLVM_PATH", "/llvm")]);
        assert!(resolve_root("AC6", vars.clone()).is_none());
        // `GCC_TOOLCHAIN` alone lacks the trailing separator.
        assert!(resolve_root("GCC", env(&[("GCC_TOOLCHAIN", "/x")])).is_none());
        assert!(resolve_root("FOO", vars).is_none());
    }

    #[test]
    fn unknown_toolchain_has_no_fallbacks() {
        assert!(fallback_variables("FOO").is_empty());
        assert_eq!(fallback_variables("CLANG"), ["LLVM_PATH", "CLANG_PATH"]);
    }

    #[test]
    fn source_display() {
        assert_eq!(RootSource::Primary("GCC_TOOLCHAIN_13".into()).to_string(), "$GCC_TOOLCHAIN_13");
        assert_eq!(RootSource::Fallback("LLVM_PATH".into()).to_string(), "$LLVM_PATH (fallback)");
    }
}
