//! Device descriptor model.
//!
//! Describes one Cortex-M core: its architecture family, code generation
//! parameters, capability tags and the CMSIS startup defines that headers
//! expect to find on the command line.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Architecture, capability and define profile for one target core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceDescriptor {
    /// Unique device identifier (e.g., "CM0", "CM3").
    pub id: String,
    /// Architecture family name (e.g., "thumbv6m").
    pub arch: String,
    /// Target triple (e.g., "thumbv6m-none-eabi").
    pub triple: String,
    /// ABI name.
    pub abi: String,
    /// CPU model passed to `-mcpu` (e.g., "cortex-m0plus").
    pub mcpu: String,
    /// FPU model, if the core has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpu: Option<String>,
    /// Whether a memory protection unit is present.
    pub mpu: bool,
    /// Declared feature tags, most general first.
    pub features: IndexSet<String>,
    /// Name of the CMSIS core header directory (e.g., "cortexm0").
    pub header: String,
    /// Preprocessor defines, in the order they are emitted.
    #[serde(default)]
    pub defines: IndexMap<String, String>,
}

impl DeviceDescriptor {
    /// Whether the core has a floating-point unit.
    pub fn has_fpu(&self) -> bool {
        self.fpu.is_some()
    }

    /// Look up a define value by name.
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    /// Whether the descriptor declares the given feature tag.
    pub fn declares(&self, tag: &str) -> bool {
        self.features.contains(tag)
    }

    /// Cortex-M0: ARMv6-M baseline, no MPU.
    pub fn cortex_m0() -> Self {
        baseline(
            "CM0",
            "cortex-m0",
            "cortexm0",
            false,
            &[
                ("__CM0_REV", "0x0000U"),
                ("__NVIC_PRIO_BITS", "2U"),
                ("__Vendor_SysTickConfig", "0U"),
            ],
        )
    }

    /// Cortex-M0+: ARMv6-M baseline with MPU and VTOR.
    pub fn cortex_m0plus() -> Self {
        baseline(
            "CM0plus",
            "cortex-m0plus",
            "cortexm0plus",
            true,
            &[
                ("__CM0PLUS_REV", "0x0000U"),
                ("__MPU_PRESENT", "1U"),
                ("__VTOR_PRESENT", "1U"),
                ("__NVIC_PRIO_BITS", "2U"),
                ("__Vendor_SysTickConfig", "0U"),
            ],
        )
    }

    /// Cortex-M1: ARMv6-M baseline for FPGA fabrics, no MPU.
    pub fn cortex_m1() -> Self {
        baseline(
            "CM1",
            "cortex-m1",
            "cortexm1",
            false,
            &[
                ("__CM1_REV", "0x0000U"),
                ("__NVIC_PRIO_BITS", "2U"),
                ("__Vendor_SysTickConfig", "0U"),
            ],
        )
    }

    /// Cortex-M3: ARMv7-M mainline with Thumb-2, saturation and exclusives.
    ///
    /// Advertises the ARMv6-M baseline tag as well, since every baseline
    /// instruction remains available.
    pub fn cortex_m3() -> Self {
        Self {
            id: "CM3".into(),
            arch: "thumbv7m".into(),
            triple: "thumbv7m-none-eabi".into(),
            abi: "eabi".into(),
            mcpu: "cortex-m3".into(),
            fpu: None,
            mpu: true,
            features: tags(&[
                "thumbv6m",
                "thumbv7m",
                "thumb-2",
                "sat",
                "ldrex",
                "clz",
                "cortex-m3",
            ]),
            header: "cortexm3".into(),
            defines: define_table(&[
                ("__CM3_REV", "0x0000U"),
                ("__MPU_PRESENT", "1U"),
                ("__VTOR_PRESENT", "1U"),
                ("__NVIC_PRIO_BITS", "3U"),
                ("__Vendor_SysTickConfig", "0U"),
            ]),
        }
    }
}

fn baseline(
    id: &str,
    mcpu: &str,
    header: &str,
    mpu: bool,
    defines: &[(&str, &str)],
) -> DeviceDescriptor {
    DeviceDescriptor {
        id: id.into(),
        arch: "thumbv6m".into(),
        triple: "thumbv6m-none-eabi".into(),
        abi: "eabi".into(),
        mcpu: mcpu.into(),
        fpu: None,
        mpu,
        features: tags(&["thumbv6m", mcpu]),
        header: header.into(),
        defines: define_table(defines),
    }
}

fn tags(list: &[&str]) -> IndexSet<String> {
    list.iter().map(|t| (*t).to_string()).collect()
}

fn define_table(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
