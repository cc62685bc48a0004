//! Feature gates.
//!
//! Tests declare the capability tags they need (`// REQUIRES: thumbv7m`) and
//! the ones they cannot run with (`// UNSUPPORTED: cortex-m1`). A test applies
//! to a device when its required tags are a subset of the device's tags and
//! none of its unsupported tags are present.

use indexmap::IndexSet;
use serde::Serialize;

use crate::descriptor::DeviceDescriptor;

/// Tag added when the core has a memory protection unit.
pub const MPU_TAG: &str = "mpu";
/// Tag added when the core has a floating-point unit.
pub const FPU_TAG: &str = "fpu";

/// Ordered set of capability tags for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet {
    tags: IndexSet<String>,
}

impl FeatureSet {
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether every tag in `required` is present.
    pub fn satisfies<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> bool {
        required.into_iter().all(|tag| self.contains(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Capability tags of a device: its declared tags followed by derived
/// hardware tags.
pub fn features(descriptor: &DeviceDescriptor) -> FeatureSet {
    let mut tags = descriptor.features.clone();
    if descriptor.mpu {
        tags.insert(MPU_TAG.to_string());
    }
    if descriptor.has_fpu() {
        tags.insert(FPU_TAG.to_string());
    }
    FeatureSet { tags }
}

/// Applicability requirements declared by one test source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestGate {
    /// Tags that must all be present.
    pub requires: Vec<String>,
    /// Tags that must all be absent.
    pub unsupported: Vec<String>,
}

impl TestGate {
    /// Extract `REQUIRES:` and `UNSUPPORTED:` directives from `//` comment lines.
    ///
    /// Directives may repeat; their tag lists accumulate.
    pub fn parse(source: &str) -> Self {
        let mut gate = Self::default();
        for line in source.lines() {
            let Some(comment) = line.trim_start().strip_prefix("//") else {
                continue;
            };
            let comment = comment.trim_start();
            if let Some(list) = comment.strip_prefix("REQUIRES:") {
                gate.requires.extend(split_tags(list));
            } else if let Some(list) = comment.strip_prefix("UNSUPPORTED:") {
                gate.unsupported.extend(split_tags(list));
            }
        }
        gate
    }

    /// Whether the test applies to a device with the given features.
    pub fn applies(&self, features: &FeatureSet) -> bool {
        features.satisfies(self.requires.iter().map(String::as_str))
            && !self.unsupported.iter().any(|tag| features.contains(tag))
    }

    /// Required tags the device lacks.
    pub fn missing<'a>(&'a self, features: &FeatureSet) -> Vec<&'a str> {
        self.requires
            .iter()
            .map(String::as_str)
            .filter(|tag| !features.contains(tag))
            .collect()
    }
}

fn split_tags(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
