//! Device descriptor model for the Cortex-M test kit.
//!
//! A [`DeviceDescriptor`] captures everything the harness needs to know about
//! one target core:
//! - **Architecture:** family name, target triple and ABI
//! - **Core:** CPU model, FPU and MPU presence
//! - **Capabilities:** feature tags used to gate test applicability
//! - **Startup defines:** CMSIS preprocessor defines, in declaration order
//!
//! Descriptors live in an immutable [`DeviceRegistry`]; the built-in registry
//! is created once per process and never mutated.

pub mod descriptor;
pub mod error;
pub mod features;
pub mod parse;
pub mod registry;

pub use descriptor::DeviceDescriptor;
pub use error::{DeviceError, Result};
pub use features::{features, FeatureSet, TestGate};
pub use registry::{lookup, DeviceRegistry, RegistryBuilder};
