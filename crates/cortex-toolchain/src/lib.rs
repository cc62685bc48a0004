//! Toolchain flag derivation for Cortex-M test builds.
//!
//! Turns a [`DeviceDescriptor`](cortex_devices::DeviceDescriptor), a
//! toolchain choice and an optimization level into an immutable, ordered
//! [`CompilerInvocation`]. The invocation is only described here; launching
//! the compiler is the caller's business.

pub mod error;
pub mod flags;
pub mod optimization;
pub mod resolve;
pub mod substitutions;
pub mod toolchain;

pub use error::{Result, ToolchainError};
pub use flags::{build, CompilerInvocation, FlagBuilder, InvocationRequest};
pub use optimization::OptimizationLevel;
pub use resolve::{resolve_root, resolve_root_from_process, ResolvedRoot, RootSource};
pub use substitutions::Substitutions;
pub use toolchain::{RootRequirement, ToolchainKind, ToolchainProfile};
