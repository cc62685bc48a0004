//! Supported cross-compilers and their resolved locations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolchainError};
use crate::resolve::{fallback_variables, resolve_root, resolve_root_from_process, ResolvedRoot, RootSource};

/// Compiler family used to build test sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolchainKind {
    /// GNU Arm Embedded (`arm-none-eabi-g++`).
    #[default]
    Gcc,
    /// LLVM/Clang.
    Clang,
    /// Arm Compiler 6 (`armclang`).
    Ac6,
}

impl ToolchainKind {
    pub const ALL: [ToolchainKind; 3] = [ToolchainKind::Gcc, ToolchainKind::Clang, ToolchainKind::Ac6];

    /// Canonical name, also the prefix of its `*_TOOLCHAIN_*` variables.
    pub fn name(self) -> &'static str {
        match self {
            ToolchainKind::Gcc => "GCC",
            ToolchainKind::Clang => "CLANG",
            ToolchainKind::Ac6 => "AC6",
        }
    }

    /// Compiler driver executable name.
    pub fn driver(self) -> &'static str {
        match self {
            ToolchainKind::Gcc => "arm-none-eabi-g++",
            ToolchainKind::Clang => "clang++",
            ToolchainKind::Ac6 => "armclang",
        }
    }

    /// Whether the driver selects its backend through `--target=<triple>`.
    pub fn takes_target_triple(self) -> bool {
        !matches!(self, ToolchainKind::Gcc)
    }
}

impl FromStr for ToolchainKind {
    type Err = ToolchainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ToolchainKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ToolchainError::UnknownToolchain { name: s.to_string() })
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How strictly the caller needs the compiler location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootRequirement {
    /// A bare driver name found on `PATH` is acceptable.
    #[default]
    SearchPath,
    /// The toolchain root must be resolved from the environment.
    Resolved,
}

/// A toolchain together with the root it was found under, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainProfile {
    kind: ToolchainKind,
    root: Option<ResolvedRoot>,
}

impl ToolchainProfile {
    pub fn new(kind: ToolchainKind, root: Option<ResolvedRoot>) -> Self {
        Self { kind, root }
    }

    /// Resolve the root from the current process environment.
    pub fn from_process(kind: ToolchainKind) -> Self {
        Self::new(kind, resolve_root_from_process(kind.name()))
    }

    /// Resolve the root from an environment snapshot.
    pub fn from_vars<I>(kind: ToolchainKind, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::new(kind, resolve_root(kind.name(), vars))
    }

    pub fn kind(&self) -> ToolchainKind {
        self.kind
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_ref().map(|r| r.path.as_path())
    }

    pub fn source(&self) -> Option<&RootSource> {
        self.root.as_ref().map(|r| &r.source)
    }

    pub fn resolved(&self) -> Option<&ResolvedRoot> {
        self.root.as_ref()
    }

    /// Path of the compiler driver.
    ///
    /// With a resolved root this is `<root>/bin/<driver>`. Without one, the
    /// bare driver name is returned unless `requirement` demands a root.
    pub fn executable(&self, requirement: RootRequirement) -> Result<PathBuf> {
        match (&self.root, requirement) {
            (Some(root), _) => Ok(root.path.join("bin").join(self.kind.driver())),
            (None, RootRequirement::SearchPath) => Ok(PathBuf::from(self.kind.driver())),
            (None, RootRequirement::Resolved) => Err(ToolchainError::UnresolvedToolchainRoot {
                toolchain: self.kind.name().to_string(),
                fallbacks: fallback_variables(self.kind.name()).join(", "),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("GCC".parse::<ToolchainKind>().unwrap(), ToolchainKind::Gcc);
        assert_eq!("clang".parse::<ToolchainKind>().unwrap(), ToolchainKind::Clang);
        assert_eq!("Ac6".parse::<ToolchainKind>().unwrap(), ToolchainKind::Ac6);
        assert!(matches!(
            "IAR".parse::<ToolchainKind>(),
            Err(ToolchainError::UnknownToolchain { .. })
        ));
    }

    #[test]
    fn executable_under_root() {
        let profile = ToolchainProfile::from_vars(
            ToolchainKind::Gcc,
            vec![("GCC_TOOLCHAIN_13".to_string(), "/opt/gcc-13".to_string())],
        );
        assert_eq!(profile.root(), Some(Path::new("/opt/gcc-13")));
        assert_eq!(
            profile.executable(RootRequirement::Resolved).unwrap(),
            PathBuf::from("/opt/gcc-13/bin/arm-none-eabi-g++")
        );
    }

    #[test]
    fn missing_root_is_fine_on_search_path() {
        let profile = ToolchainProfile::from_vars(ToolchainKind::Clang, Vec::new());
        assert!(profile.root().is_none());
        assert!(profile.source().is_none());
        assert_eq!(
            profile.executable(RootRequirement::SearchPath).unwrap(),
            PathBuf::from("clang++")
        );
    }

    #[test]
    fn missing_root_fails_when_required() {
        let profile = ToolchainProfile::from_vars(ToolchainKind::Ac6, Vec::new());
        let err = profile.executable(RootRequirement::Resolved).unwrap_err();
        match err {
            ToolchainError::UnresolvedToolchainRoot { toolchain, fallbacks } => {
                assert_eq!(toolchain, "AC6");
                assert_eq!(fallbacks, "ARMCLANG_PATH, AC6_PATH");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn only_gcc_omits_target_triple() {
        assert!(!ToolchainKind::Gcc.takes_target_triple());
        assert!(ToolchainKind::Clang.takes_target_triple());
        assert!(ToolchainKind::Ac6.takes_target_triple());
    }
}
