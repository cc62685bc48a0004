//! Compiler invocation builder.
//!
//! Flags are emitted in a fixed order that downstream tests pattern-match on:
//!
//! 1. CPU/ABI: `-mcpu=`, then `--target=` (LLVM and Arm Compiler) and FPU flags
//! 2. `-mthumb`
//! 3. optimization flag
//! 4. include paths: the shared header root, then the core's header directory
//! 5. `-std=`
//! 6. `-c`
//! 7. `-D<name>=<value>` per descriptor define, in declaration order

use std::fmt;
use std::path::{Path, PathBuf};

use cortex_devices::{DeviceDescriptor, DeviceRegistry};
use serde::Serialize;

use crate::error::Result;
use crate::optimization::OptimizationLevel;
use crate::toolchain::{RootRequirement, ToolchainKind, ToolchainProfile};

/// Language standard used when none is configured.
pub const DEFAULT_STD: &str = "c++20";

/// Shared header root used when none is configured.
pub const DEFAULT_INCLUDE_ROOT: &str = "include";

/// An ordered compiler command line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerInvocation {
    executable: PathBuf,
    tokens: Vec<String>,
}

impl CompilerInvocation {
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Flag tokens, without the executable.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The `-D` tokens, in emission order.
    pub fn defines(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|t| t.starts_with("-D"))
    }

    /// Flag tokens joined by single spaces.
    pub fn flags_line(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for CompilerInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.executable.display())?;
        for token in &self.tokens {
            write!(f, " {token}")?;
        }
        Ok(())
    }
}

/// Builds [`CompilerInvocation`]s with a fixed include root and language standard.
#[derive(Debug, Clone)]
pub struct FlagBuilder {
    include_root: PathBuf,
    std: String,
    requirement: RootRequirement,
}

impl Default for FlagBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_INCLUDE_ROOT)
    }
}

impl FlagBuilder {
    pub fn new(include_root: impl Into<PathBuf>) -> Self {
        Self {
            include_root: include_root.into(),
            std: DEFAULT_STD.to_string(),
            requirement: RootRequirement::SearchPath,
        }
    }

    /// Override the language standard (e.g. "c++17").
    pub fn std(mut self, std: impl Into<String>) -> Self {
        self.std = std.into();
        self
    }

    /// Require the toolchain root to be resolved.
    pub fn require(mut self, requirement: RootRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Derive the invocation for one (device, toolchain, level) triple.
    ///
    /// Fails only with `UnresolvedToolchainRoot`, when a resolved root is
    /// required and the profile has none.
    pub fn build(
        &self,
        descriptor: &DeviceDescriptor,
        toolchain: &ToolchainProfile,
        optimization: OptimizationLevel,
    ) -> Result<CompilerInvocation> {
        let executable = toolchain.executable(self.requirement)?;

        let mut tokens = vec![format!("-mcpu={}", descriptor.mcpu)];
        if toolchain.kind().takes_target_triple() {
            tokens.push(format!("--target={}", descriptor.triple));
        }
        if let Some(fpu) = &descriptor.fpu {
            tokens.push(format!("-mfpu={fpu}"));
            tokens.push("-mfloat-abi=hard".to_string());
        }
        tokens.push("-mthumb".to_string());
        tokens.push(optimization.flag().to_string());
        tokens.push(format!("-I{}", self.include_root.display()));
        tokens.push(format!(
            "-I{}",
            self.include_root.join(&descriptor.header).display()
        ));
        tokens.push(format!("-std={}", self.std));
        tokens.push("-c".to_string());
        tokens.extend(
            descriptor
                .defines
                .iter()
                .map(|(name, value)| format!("-D{name}={value}")),
        );

        let invocation = CompilerInvocation { executable, tokens };
        log::debug!("{} [{}, {}]: {}", descriptor.id, toolchain.kind(), optimization, invocation);
        Ok(invocation)
    }
}

/// Build with the default include root and language standard, accepting a
/// bare driver name.
pub fn build(
    descriptor: &DeviceDescriptor,
    toolchain: &ToolchainProfile,
    optimization: OptimizationLevel,
) -> Result<CompilerInvocation> {
    FlagBuilder::default().build(descriptor, toolchain, optimization)
}

/// Free-form harness parameters, each optional.
#[derive(Debug, Clone, Default)]
pub struct InvocationRequest {
    pub device: Option<String>,
    pub toolchain: Option<String>,
    pub optimize: Option<String>,
}

/// An [`InvocationRequest`] with every parameter parsed and looked up.
#[derive(Debug, Clone)]
pub struct ResolvedRequest<'r> {
    pub descriptor: &'r DeviceDescriptor,
    pub toolchain: ToolchainKind,
    pub optimization: OptimizationLevel,
}

impl InvocationRequest {
    pub const DEFAULT_DEVICE: &'static str = "CM0";
    pub const DEFAULT_TOOLCHAIN: &'static str = "GCC";
    pub const DEFAULT_OPTIMIZE: &'static str = "none";

    /// Apply defaults, then resolve the device, toolchain and level.
    ///
    /// A supplied but unknown value is always an error; defaults apply only
    /// to parameters that were not given.
    pub fn resolve<'r>(&self, registry: &'r DeviceRegistry) -> Result<ResolvedRequest<'r>> {
        let device = self.device.as_deref().unwrap_or(Self::DEFAULT_DEVICE);
        let toolchain = self.toolchain.as_deref().unwrap_or(Self::DEFAULT_TOOLCHAIN);
        let optimize = self.optimize.as_deref().unwrap_or(Self::DEFAULT_OPTIMIZE);
        Ok(ResolvedRequest {
            descriptor: registry.lookup(device)?,
            toolchain: toolchain.parse()?,
            optimization: optimize.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use cortex_devices::DeviceError;

    use super::*;
    use crate::error::ToolchainError;

    fn gcc() -> ToolchainProfile {
        ToolchainProfile::new(ToolchainKind::Gcc, None)
    }

    #[test]
    fn m0_gcc_full_order() {
        let inv = build(&DeviceDescriptor::cortex_m0(), &gcc(), OptimizationLevel::None).unwrap();
        assert_eq!(inv.executable(), Path::new("arm-none-eabi-g++"));
        assert_eq!(
            inv.tokens(),
            [
                "-mcpu=cortex-m0",
                "-mthumb",
                "-O0",
                "-Iinclude",
                "-Iinclude/cortexm0",
                "-std=c++20",
                "-c",
                "-D__CM0_REV=0x0000U",
                "-D__NVIC_PRIO_BITS=2U",
                "-D__Vendor_SysTickConfig=0U",
            ]
        );
    }

    #[test]
    fn clang_adds_target_in_cpu_group() {
        let clang = ToolchainProfile::new(ToolchainKind::Clang, None);
        let inv = build(&DeviceDescriptor::cortex_m3(), &clang, OptimizationLevel::Speed).unwrap();
        assert_eq!(&inv.tokens()[..4], ["-mcpu=cortex-m3", "--target=thumbv7m-none-eabi", "-mthumb", "-O3"]);
        assert_eq!(inv.executable(), Path::new("clang++"));
    }

    #[test]
    fn fpu_flags_precede_thumb() {
        let mut d = DeviceDescriptor::cortex_m3();
        d.fpu = Some("fpv4-sp-d16".into());
        let inv = build(&d, &gcc(), OptimizationLevel::Size).unwrap();
        assert_eq!(
            &inv.tokens()[..5],
            ["-mcpu=cortex-m3", "-mfpu=fpv4-sp-d16", "-mfloat-abi=hard", "-mthumb", "-Os"]
        );
    }

    #[test]
    fn build_is_deterministic() {
        let d = DeviceDescriptor::cortex_m0plus();
        for level in OptimizationLevel::ALL {
            let a = build(&d, &gcc(), level).unwrap();
            let b = build(&d, &gcc(), level).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn defines_follow_declaration_order() {
        let mut d = DeviceDescriptor::cortex_m0();
        d.defines.clear();
        d.defines.insert("__X_REV".into(), "0x0000U".into());
        d.defines.insert("__NVIC_PRIO_BITS".into(), "2U".into());

        let inv = build(&d, &gcc(), OptimizationLevel::Balanced).unwrap();
        let defines: Vec<&str> = inv.defines().collect();
        assert_eq!(defines, ["-D__X_REV=0x0000U", "-D__NVIC_PRIO_BITS=2U"]);
        for token in defines {
            let (name, value) = token.trim_start_matches("-D").split_once('=').unwrap();
            assert!(!name.is_empty() && !value.is_empty());
        }
        // Defines come last.
        assert_eq!(inv.tokens().last().map(String::as_str), Some("-D__NVIC_PRIO_BITS=2U"));
    }

    #[test]
    fn exactly_one_optimization_flag() {
        let inv = build(&DeviceDescriptor::cortex_m1(), &gcc(), OptimizationLevel::Speed).unwrap();
        let opt: Vec<&String> = inv.tokens().iter().filter(|t| t.starts_with("-O")).collect();
        assert_eq!(opt, ["-O3"]);
    }

    #[test]
    fn custom_include_root_and_std() {
        let builder = FlagBuilder::new("/work/lib/include").std("c++17");
        let inv = builder
            .build(&DeviceDescriptor::cortex_m3(), &gcc(), OptimizationLevel::None)
            .unwrap();
        assert!(inv.tokens().contains(&"-I/work/lib/include".to_string()));
        assert!(inv.tokens().contains(&"-I/work/lib/include/cortexm3".to_string()));
        assert!(inv.tokens().contains(&"-std=c++17".to_string()));
    }

    #[test]
    fn required_root_missing_fails() {
        let builder = FlagBuilder::default().require(RootRequirement::Resolved);
        let err = builder
            .build(&DeviceDescriptor::cortex_m0(), &gcc(), OptimizationLevel::None)
            .unwrap_err();
        assert!(matches!(err, ToolchainError::UnresolvedToolchainRoot { .. }));
    }

    #[test]
    fn display_joins_executable_and_flags() {
        let profile = ToolchainProfile::from_vars(
            ToolchainKind::Gcc,
            vec![("ARM_GCC_PATH".to_string(), "/opt/arm".to_string())],
        );
        let inv = build(&DeviceDescriptor::cortex_m0(), &profile, OptimizationLevel::None).unwrap();
        let line = inv.to_string();
        assert!(line.starts_with("/opt/arm/bin/arm-none-eabi-g++ -mcpu=cortex-m0 -mthumb -O0"));
        assert!(line.ends_with(&inv.flags_line()));
    }

    #[test]
    fn request_defaults() {
        let resolved = InvocationRequest::default()
            .resolve(DeviceRegistry::builtin())
            .unwrap();
        assert_eq!(resolved.descriptor.id, "CM0");
        assert_eq!(resolved.toolchain, ToolchainKind::Gcc);
        assert_eq!(resolved.optimization, OptimizationLevel::None);
    }

    #[test]
    fn request_errors() {
        let registry = DeviceRegistry::builtin();
        let unknown_device = InvocationRequest {
            device: Some("CM99".into()),
            ..Default::default()
        };
        assert!(matches!(
            unknown_device.resolve(registry).unwrap_err(),
            ToolchainError::Device(DeviceError::UnknownDevice { .. })
        ));

        let bad_level = InvocationRequest {
            optimize: Some("fastest".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad_level.resolve(registry).unwrap_err(),
            ToolchainError::UnsupportedOptimizationLevel { .. }
        ));

        let bad_toolchain = InvocationRequest {
            toolchain: Some("IAR".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad_toolchain.resolve(registry).unwrap_err(),
            ToolchainError::UnknownToolchain { .. }
        ));
    }
}
