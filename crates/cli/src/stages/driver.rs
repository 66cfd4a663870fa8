//! Kernel driver stage.
//!
//! Installs the kernel build prerequisites and the pinned NVIDIA driver
//! metapackage from the distribution archive.

use anyhow::{bail, Result};
use hostops::apt;
use hostops::runner::{CommandRunner, CommandSpec};

use crate::config;

/// Install driver prerequisites and the driver package.
///
/// # Errors
///
/// Returns an error on the first failing command.
pub fn install(runner: &dyn CommandRunner) -> Result<()> {
    apt::update(runner)?;

    let kernel = kernel_release(runner)?;
    let headers = format!("linux-headers-{kernel}");
    let mut prereqs: Vec<&str> = config::DRIVER_PREREQ_PACKAGES.to_vec();
    prereqs.push(&headers);
    apt::install(runner, &prereqs)?;

    apt::install(runner, &[config::DRIVER_PACKAGE])?;
    Ok(())
}

/// Purge driver packages. Invoked best-effort on teardown.
///
/// # Errors
///
/// Returns an error if the purge command fails.
pub fn remove(runner: &dyn CommandRunner) -> Result<()> {
    apt::purge(runner, &["^nvidia-driver-.*", "^nvidia-dkms-.*", "^libnvidia-.*"])
}

fn kernel_release(runner: &dyn CommandRunner) -> Result<String> {
    let output = runner.run(&CommandSpec::new("uname").arg("-r"))?;
    let release = output.stdout.trim().to_string();
    if release.is_empty() {
        bail!("uname reported an empty kernel release");
    }
    Ok(release)
}
