//! Optimization level to compiler flag mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ToolchainError;

/// Optimization level requested by the test harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationLevel {
    /// No optimization (`-O0`).
    #[default]
    None,
    /// Balanced performance (`-O2`).
    Balanced,
    /// Maximum speed (`-O3`).
    Speed,
    /// Minimal code size (`-Os`).
    Size,
}

impl OptimizationLevel {
    pub const ALL: [OptimizationLevel; 4] = [
        OptimizationLevel::None,
        OptimizationLevel::Balanced,
        OptimizationLevel::Speed,
        OptimizationLevel::Size,
    ];

    /// The single compiler flag for this level.
    pub fn flag(self) -> &'static str {
        match self {
            OptimizationLevel::None => "-O0",
            OptimizationLevel::Balanced => "-O2",
            OptimizationLevel::Speed => "-O3",
            OptimizationLevel::Size => "-Os",
        }
    }

    /// Level-specific FileCheck prefix, used alongside the common `CHECK`.
    pub fn check_prefix(self) -> &'static str {
        match self {
            OptimizationLevel::None => "NONE",
            OptimizationLevel::Balanced => "BALANCED",
            OptimizationLevel::Speed => "MAXSPEED",
            OptimizationLevel::Size => "MINSIZE",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OptimizationLevel::None => "none",
            OptimizationLevel::Balanced => "balanced",
            OptimizationLevel::Speed => "speed",
            OptimizationLevel::Size => "size",
        }
    }
}

impl FromStr for OptimizationLevel {
    type Err = ToolchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptimizationLevel::ALL
            .into_iter()
            .find(|level| level.name() == s)
            .ok_or_else(|| ToolchainError::UnsupportedOptimizationLevel {
                level: s.to_string(),
            })
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
