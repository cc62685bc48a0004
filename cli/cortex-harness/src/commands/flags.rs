//! `cortex-harness flags`: compiler invocation for one build configuration.

use anyhow::{Context, Result};
use cortex_devices::{DeviceDescriptor, DeviceRegistry};
use cortex_toolchain::{
    CompilerInvocation, FlagBuilder, InvocationRequest, OptimizationLevel, ResolvedRoot,
    RootRequirement, ToolchainKind, ToolchainProfile,
};
use serde::Serialize;

use super::{to_json, Format};
use crate::manifest::HarnessManifest;

/// A fully derived build configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Derived<'r> {
    pub device: &'r DeviceDescriptor,
    pub toolchain: ToolchainKind,
    pub optimization: OptimizationLevel,
    pub root: Option<ResolvedRoot>,
    pub invocation: CompilerInvocation,
}

/// Resolve `request` against the registry and derive its invocation.
///
/// `locate` finds the toolchain root, normally from the process environment.
pub fn derive<'r>(
    registry: &'r DeviceRegistry,
    manifest: &HarnessManifest,
    request: &InvocationRequest,
    requirement: RootRequirement,
    locate: impl FnOnce(ToolchainKind) -> ToolchainProfile,
) -> Result<Derived<'r>> {
    let resolved = request.resolve(registry)?;
    let profile = locate(resolved.toolchain);
    let invocation = FlagBuilder::new(manifest.include_root())
        .std(manifest.std())
        .require(requirement)
        .build(resolved.descriptor, &profile, resolved.optimization)
        .with_context(|| format!("deriving flags for {}", resolved.descriptor.id))?;
    Ok(Derived {
        device: resolved.descriptor,
        toolchain: resolved.toolchain,
        optimization: resolved.optimization,
        root: profile.resolved().cloned(),
        invocation,
    })
}

/// Print the invocation, one line, or the whole derivation as JSON.
pub fn render(derived: &Derived<'_>, format: Format) -> Result<String> {
    match format {
        Format::Json => to_json(derived),
        Format::Text => Ok(format!("{}\n", derived.invocation)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn request(device: &str, toolchain: &str, optimize: &str) -> InvocationRequest {
        InvocationRequest {
            device: Some(device.into()),
            toolchain: Some(toolchain.into()),
            optimize: Some(optimize.into()),
        }
    }

    #[test]
    fn defaults_build_cm0_gcc_o0() {
        let registry = DeviceRegistry::builtin();
        let derived = derive(
            registry,
            &HarnessManifest::default(),
            &InvocationRequest::default(),
            RootRequirement::SearchPath,
            |kind| ToolchainProfile::from_vars(kind, env(&[])),
        )
        .unwrap();
        assert_eq!(derived.device.id, "CM0");
        assert_eq!(derived.toolchain, ToolchainKind::Gcc);
        assert_eq!(derived.optimization, OptimizationLevel::None);
        assert!(derived.root.is_none());
        let text = render(&derived, Format::Text).unwrap();
        assert!(text.starts_with("arm-none-eabi-g++ -mcpu=cortex-m0 -mthumb -O0 "));
        assert!(text.ends_with("-D__Vendor_SysTickConfig=0U\n"));
    }

    #[test]
    fn resolved_root_and_manifest_paths() {
        let registry = DeviceRegistry::builtin();
        let manifest = HarnessManifest::from_str(
            "[paths]\ninclude-root = \"cmsis\"\n[compiler]\nstd = \"c++17\"\n",
        )
        .unwrap();
        let derived = derive(
            registry,
            &manifest,
            &request("CM3", "clang", "speed"),
            RootRequirement::Resolved,
            |kind| ToolchainProfile::from_vars(kind, env(&[("LLVM_PATH", "/opt/llvm")])),
        )
        .unwrap();
        assert_eq!(
            derived.invocation.executable(),
            std::path::Path::new("/opt/llvm/bin/clang++")
        );
        let tokens = derived.invocation.tokens();
        assert!(tokens.contains(&"--target=thumbv7m-none-eabi".to_string()));
        assert!(tokens.contains(&"-Icmsis/cortexm3".to_string()));
        assert!(tokens.contains(&"-std=c++17".to_string()));

        let json: serde_json::Value =
            serde_json::from_str(&render(&derived, Format::Json).unwrap()).unwrap();
        assert_eq!(json["root"]["source"]["variable"], "LLVM_PATH");
        assert_eq!(json["device"]["id"], "CM3");
    }

    #[test]
    fn required_root_missing_fails() {
        let err = derive(
            DeviceRegistry::builtin(),
            &HarnessManifest::default(),
            &request("CM1", "AC6", "size"),
            RootRequirement::Resolved,
            |kind| ToolchainProfile::from_vars(kind, env(&[])),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("AC6"));
    }

    #[test]
    fn unknown_values_fail() {
        let registry = DeviceRegistry::builtin();
        let manifest = HarnessManifest::default();
        let locate = |kind: ToolchainKind| ToolchainProfile::from_vars(kind, env(&[]));
        for req in [
            request("CM7", "GCC", "none"),
            request("CM0", "icc", "none"),
            request("CM0", "GCC", "O2"),
        ] {
            assert!(derive(registry, &manifest, &req, RootRequirement::SearchPath, locate).is_err());
        }
    }
}
