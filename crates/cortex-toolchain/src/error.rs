//! Toolchain errors.

use cortex_devices::DeviceError;
use thiserror::Error;

/// Errors that can occur while deriving a compiler invocation.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("unsupported optimization level '{level}' (expected none, balanced, speed or size)")]
    UnsupportedOptimizationLevel { level: String },

    #[error("unknown toolchain '{name}' (expected GCC, CLANG or AC6)")]
    UnknownToolchain { name: String },

    #[error("toolchain '{toolchain}' root not found (set {toolchain}_TOOLCHAIN_<VERSION> or one of: {fallbacks})")]
    UnresolvedToolchainRoot { toolchain: String, fallbacks: String },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Result type for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
