//! Cortex harness CLI: compiler flags, feature gates and peripheral replay
//! for Cortex-M test builds.

mod commands;
mod logger;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand};
use cortex_toolchain::{InvocationRequest, RootRequirement, ToolchainProfile};

use commands::Format;
use logger::HarnessLogger;
use manifest::HarnessManifest;

#[derive(Parser)]
#[command(name = "cortex-harness", version, about = "Cortex-M test build harness")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create harness.toml in the current directory
    Init,
    /// Inspect device descriptors
    Devices {
        #[command(subcommand)]
        action: DevicesAction,
    },
    /// Print the compiler invocation for a build configuration
    Flags {
        #[command(flatten)]
        selection: Selection,
        /// Fail unless the toolchain root is found in the environment
        #[arg(long)]
        require_root: bool,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Print the feature tags of a device
    Features {
        /// Device identifier (default: manifest, then CM0)
        #[arg(long)]
        device: Option<String>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Evaluate the REQUIRES/UNSUPPORTED directives of a test source
    Gate {
        /// Test source file
        file: PathBuf,
        /// Evaluate a single device instead of all of them
        #[arg(long)]
        device: Option<String>,
        /// Exit with an error when the test applies to no evaluated device
        #[arg(long)]
        check: bool,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Print lit substitutions for a build configuration
    Subst {
        #[command(flatten)]
        selection: Selection,
        /// Expand the placeholders in this RUN line instead of listing them
        #[arg(long)]
        expand: Option<String>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Replay a bus trace against the test output peripherals
    Emulate {
        /// Trace file
        trace: PathBuf,
        /// Exit with an error unless the run signals completion
        #[arg(long)]
        expect_complete: bool,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Check toolchain and project status
    Doctor,
}

#[derive(Subcommand)]
enum DevicesAction {
    /// List registered devices
    List {
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Show details of a device
    Describe {
        /// Device identifier
        id: String,
        /// Output format (default: human-readable, "toml" or "json")
        #[arg(long)]
        format: Option<String>,
    },
    /// Validate a .device.toml file
    Validate {
        /// Path to the descriptor
        path: PathBuf,
    },
    /// Print a starter .device.toml
    Template {
        /// Identifier for the new device
        id: String,
    },
}

/// Build configuration; unset values fall back to `[defaults]` in harness.toml.
#[derive(Args)]
struct Selection {
    /// Device identifier (e.g., CM0, CM0plus, CM1, CM3)
    #[arg(long)]
    device: Option<String>,
    /// Toolchain (GCC, CLANG, AC6)
    #[arg(long)]
    toolchain: Option<String>,
    /// Optimization level (none, balanced, speed, size)
    #[arg(long)]
    optimize: Option<String>,
}

impl Selection {
    fn into_request(self, manifest: &HarnessManifest) -> InvocationRequest {
        let request = InvocationRequest {
            device: self.device,
            toolchain: self.toolchain,
            optimize: self.optimize,
        };
        commands::with_defaults(request, &manifest.defaults)
    }
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (manifest, project_dir) = load_manifest_optional(&cwd)?;
    let manifest = manifest.unwrap_or_default();
    let project_dir = project_dir.unwrap_or_else(|| cwd.clone());

    let level = logger::select_level(cli.verbose, cli.quiet, manifest.log_level()?);
    HarnessLogger::init(level).map_err(|e| anyhow::anyhow!("installing logger: {e}"))?;

    let out = match cli.command {
        Commands::Init => {
            let path = commands::init::run(&cwd)?;
            format!("created {}\n", path.display())
        }

        Commands::Devices { action } => {
            let registry = commands::load_registry(&project_dir, &manifest)?;
            match action {
                DevicesAction::List { format } => {
                    commands::devices::list(&registry, Format::parse(format.as_deref())?)?
                }
                DevicesAction::Describe { id, format } => {
                    commands::devices::describe(&registry, &id, format.as_deref())?
                }
                DevicesAction::Validate { path } => commands::devices::validate(&path)?,
                DevicesAction::Template { id } => commands::devices::template(&id)?,
            }
        }

        Commands::Flags {
            selection,
            require_root,
            format,
        } => {
            let format = Format::parse(format.as_deref())?;
            let registry = commands::load_registry(&project_dir, &manifest)?;
            let requirement = if require_root {
                RootRequirement::Resolved
            } else {
                RootRequirement::SearchPath
            };
            let derived = commands::flags::derive(
                &registry,
                &manifest,
                &selection.into_request(&manifest),
                requirement,
                ToolchainProfile::from_process,
            )?;
            commands::flags::render(&derived, format)?
        }

        Commands::Features { device, format } => {
            let format = Format::parse(format.as_deref())?;
            let registry = commands::load_registry(&project_dir, &manifest)?;
            let id = device
                .or_else(|| manifest.defaults.device.clone())
                .unwrap_or_else(|| InvocationRequest::DEFAULT_DEVICE.to_string());
            commands::features::render(&registry, &id, format)?
        }

        Commands::Gate {
            file,
            device,
            check,
            format,
        } => {
            let format = Format::parse(format.as_deref())?;
            let registry = commands::load_registry(&project_dir, &manifest)?;
            commands::gate::run(&file, &registry, device.as_deref(), check, format)?
        }

        Commands::Subst {
            selection,
            expand,
            format,
        } => {
            let format = Format::parse(format.as_deref())?;
            let registry = commands::load_registry(&project_dir, &manifest)?;
            let derived = commands::flags::derive(
                &registry,
                &manifest,
                &selection.into_request(&manifest),
                RootRequirement::SearchPath,
                ToolchainProfile::from_process,
            )?;
            commands::subst::render(&derived, expand.as_deref(), format)?
        }

        Commands::Emulate {
            trace,
            expect_complete,
            format,
        } => {
            let format = Format::parse(format.as_deref())?;
            commands::emulate::run(&trace, manifest.machine, expect_complete, format)?
        }

        Commands::Doctor => commands::doctor::run(&cwd, ToolchainProfile::from_process)?,
    };

    print!("{out}");
    Ok(())
}

/// Try to load a manifest from the current directory upward. Returns (None, None) if not found.
fn load_manifest_optional(
    cwd: &Path,
) -> anyhow::Result<(Option<HarnessManifest>, Option<PathBuf>)> {
    match HarnessManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}
