//! Device descriptor registry.
//!
//! The registry is a single canonical table keyed by device identifier.
//! It is assembled once, through [`RegistryBuilder`], and is read-only
//! afterwards. Registering the same identifier twice is an error rather than
//! a silent override.

use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::descriptor::DeviceDescriptor;
use crate::error::{DeviceError, Result};
use crate::parse::{discover_devices_in, load_device_toml, DEVICES_DIR};

static BUILTIN: OnceLock<DeviceRegistry> = OnceLock::new();

/// Immutable mapping from device identifier to descriptor.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: IndexMap<String, DeviceDescriptor>,
}

impl DeviceRegistry {
    /// The process-wide registry of built-in cores.
    pub fn builtin() -> &'static DeviceRegistry {
        BUILTIN.get_or_init(|| DeviceRegistry {
            devices: builtin_descriptors()
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
        })
    }

    /// Start a registry seeded with the built-in cores.
    pub fn builder() -> RegistryBuilder {
        let mut builder = RegistryBuilder::new();
        for descriptor in builtin_descriptors() {
            builder.devices.insert(descriptor.id.clone(), descriptor);
        }
        builder
    }

    /// Resolve a device identifier.
    pub fn lookup(&self, id: &str) -> Result<&DeviceDescriptor> {
        self.devices
            .get(id)
            .ok_or_else(|| DeviceError::UnknownDevice { id: id.to_string() })
    }

    /// Whether a descriptor is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    /// Registered identifiers, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    /// Registered descriptors, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Resolve a device identifier against the built-in registry.
pub fn lookup(id: &str) -> Result<&'static DeviceDescriptor> {
    DeviceRegistry::builtin().lookup(id)
}

/// Assembles a [`DeviceRegistry`], rejecting duplicate identifiers.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    devices: IndexMap<String, DeviceDescriptor>,
}

impl RegistryBuilder {
    /// An empty builder with no built-in cores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one descriptor.
    pub fn add(mut self, descriptor: DeviceDescriptor) -> Result<Self> {
        if self.devices.contains_key(&descriptor.id) {
            return Err(DeviceError::DuplicateDevice { id: descriptor.id });
        }
        self.devices.insert(descriptor.id.clone(), descriptor);
        Ok(self)
    }

    /// Register every `.device.toml` file found in `<project_dir>/devices`.
    pub fn load_project(self, project_dir: &Path) -> Result<Self> {
        self.load_dir(&project_dir.join(DEVICES_DIR))
    }

    /// Register every `.device.toml` file found directly in `devices_dir`.
    pub fn load_dir(mut self, devices_dir: &Path) -> Result<Self> {
        for (_, path) in discover_devices_in(devices_dir)? {
            self = self.add(load_device_toml(&path)?)?;
        }
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> DeviceRegistry {
        DeviceRegistry {
            devices: self.devices,
        }
    }
}

fn builtin_descriptors() -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor::cortex_m0(),
        DeviceDescriptor::cortex_m0plus(),
        DeviceDescriptor::cortex_m1(),
        DeviceDescriptor::cortex_m3(),
    ]
}
