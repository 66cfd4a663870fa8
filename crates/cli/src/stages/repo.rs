//! NVIDIA package repository setup.
//!
//! Shared helper used ahead of the toolkit stage. Idempotent: conflicting
//! legacy source lists are dropped first, and re-installing the keyring
//! package over itself is harmless, so the helper is safe to call on every
//! run.

use anyhow::{bail, Result};
use hostops::runner::CommandRunner;
use hostops::{apt, fetch, keyring, Platform};

use crate::config::{self, ProvisionConfig};

/// Register the NVIDIA CUDA repository and refresh the package index.
///
/// # Errors
///
/// Returns an error on the first failing command.
pub fn ensure_cuda_repo(
    runner: &dyn CommandRunner,
    config: &ProvisionConfig,
    platform: &Platform,
) -> Result<()> {
    for list in config.legacy_cuda_lists() {
        keyring::remove_source_list(&list)?;
    }

    let arch = cuda_arch(&apt::print_architecture(runner)?)?;
    let url = format!(
        "{}/{}/{arch}/{}",
        config::CUDA_REPO_BASE,
        platform.repo_tag(),
        config::CUDA_KEYRING_DEB
    );

    let deb_path = std::env::temp_dir().join(config::CUDA_KEYRING_DEB);
    fetch::fetch_to_file(runner, &url, &deb_path)?;
    let installed = apt::dpkg_install(runner, &deb_path);
    // Best-effort cleanup of the downloaded archive.
    let _ = std::fs::remove_file(&deb_path);
    installed?;

    apt::update(runner)
}

/// Map a dpkg architecture onto the CUDA mirror's path component.
fn cuda_arch(dpkg_arch: &str) -> Result<&'static str> {
    match dpkg_arch {
        "amd64" => Ok("x86_64"),
        "arm64" => Ok("sbsa"),
        other => bail!("No CUDA repository for architecture {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuda_arch_mapping() {
        assert_eq!(cuda_arch("amd64").unwrap(), "x86_64");
        assert_eq!(cuda_arch("arm64").unwrap(), "sbsa");
        assert!(cuda_arch("riscv64").is_err());
    }
}
