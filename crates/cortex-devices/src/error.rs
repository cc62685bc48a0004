//! Error types for device descriptor operations.

use std::path::PathBuf;

/// Errors that can occur while looking up or loading device descriptors.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No descriptor is registered under the requested identifier.
    #[error("unknown device: '{id}'")]
    UnknownDevice {
        /// The identifier that failed to resolve.
        id: String,
    },

    /// Two descriptors were registered under the same identifier.
    #[error("device '{id}' is defined more than once")]
    DuplicateDevice {
        /// The identifier that was registered twice.
        id: String,
    },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading descriptor files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Descriptor file not found.
    #[error("device file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Validation error in a descriptor definition.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
