//! `cortex-harness init`: write a starter `harness.toml`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cortex_devices::parse::DEVICES_DIR;

use crate::manifest::{HarnessManifest, MANIFEST_FILE};

/// Create `harness.toml` and an empty `devices/` directory in `dir`.
pub fn run(dir: &Path) -> Result<PathBuf> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        bail!("{} already exists", manifest_path.display());
    }
    std::fs::create_dir_all(dir.join(DEVICES_DIR))
        .with_context(|| format!("creating {}", dir.join(DEVICES_DIR).display()))?;
    std::fs::write(&manifest_path, HarnessManifest::template())
        .with_context(|| format!("writing {}", manifest_path.display()))?;
    Ok(manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_loadable_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = run(dir.path()).unwrap();
        assert!(path.is_file());
        assert!(dir.path().join("devices").is_dir());

        let (manifest, found) = HarnessManifest::find_and_load(dir.path()).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(manifest.defaults.toolchain.as_deref(), Some("GCC"));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "# mine\n").unwrap();
        assert!(run(dir.path()).is_err());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap(),
            "# mine\n"
        );
    }
}
