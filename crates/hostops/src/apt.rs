//! Package manager operations.
//!
//! Thin wrappers over `apt-get` and `dpkg`, always non-interactive. Each
//! function goes through the [`CommandRunner`] seam and surfaces the tool's
//! own failure status unchanged.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::runner::{CommandRunner, CommandSpec};

fn apt_get<I, S>(args: I) -> CommandSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CommandSpec::new("apt-get")
        .args(args)
        .env("DEBIAN_FRONTEND", "noninteractive")
}

/// Refresh the package index.
///
/// # Errors
///
/// Returns an error if `apt-get update` fails.
pub fn update(runner: &dyn CommandRunner) -> Result<()> {
    runner
        .run(&apt_get(["update"]))
        .context("Failed to refresh the package index")?;
    Ok(())
}

/// Install packages.
///
/// # Errors
///
/// Returns an error if `apt-get install` fails.
pub fn install(runner: &dyn CommandRunner, packages: &[&str]) -> Result<()> {
    runner
        .run(&apt_get(["install", "-y"]).args(packages.iter().copied()))
        .with_context(|| format!("Failed to install {}", packages.join(", ")))?;
    Ok(())
}

/// Install packages pinned to an exact version (`pkg=version`).
///
/// # Errors
///
/// Returns an error if `apt-get install` fails.
pub fn install_pinned(runner: &dyn CommandRunner, packages: &[&str], version: &str) -> Result<()> {
    let pinned: Vec<String> = packages.iter().map(|p| format!("{p}={version}")).collect();
    runner
        .run(&apt_get(["install", "-y"]).args(pinned))
        .with_context(|| format!("Failed to install {} at {version}", packages.join(", ")))?;
    Ok(())
}

/// Purge packages matching the given names or `^`-anchored patterns.
///
/// # Errors
///
/// Returns an error if `apt-get purge` fails.
pub fn purge(runner: &dyn CommandRunner, patterns: &[&str]) -> Result<()> {
    runner
        .run(&apt_get(["purge", "-y"]).args(patterns.iter().copied()))
        .with_context(|| format!("Failed to purge {}", patterns.join(", ")))?;
    Ok(())
}

/// Remove packages that are no longer required.
///
/// # Errors
///
/// Returns an error if `apt-get autoremove` fails.
pub fn autoremove(runner: &dyn CommandRunner) -> Result<()> {
    runner
        .run(&apt_get(["autoremove", "-y"]))
        .context("Failed to autoremove unused packages")?;
    Ok(())
}

/// Install a local `.deb` archive.
///
/// # Errors
///
/// Returns an error if `dpkg -i` fails.
pub fn dpkg_install(runner: &dyn CommandRunner, path: &Path) -> Result<()> {
    runner
        .run(&CommandSpec::new("dpkg").arg("-i").arg(path.display().to_string()))
        .with_context(|| format!("Failed to install {}", path.display()))?;
    Ok(())
}

/// The dpkg architecture of the host (e.g. `amd64`).
///
/// # Errors
///
/// Returns an error if `dpkg --print-architecture` fails or prints nothing.
pub fn print_architecture(runner: &dyn CommandRunner) -> Result<String> {
    let output = runner
        .run(&CommandSpec::new("dpkg").arg("--print-architecture"))
        .context("Failed to query the dpkg architecture")?;
    let arch = output.stdout.trim().to_string();
    if arch.is_empty() {
        bail!("dpkg reported an empty architecture");
    }
    Ok(arch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RecordingRunner;

    #[test]
    fn test_install_is_noninteractive() {
        let runner = RecordingRunner::new();
        install(&runner, &["curl", "gnupg"]).unwrap();

        let calls = runner.calls();
        assert_eq!(calls, vec!["apt-get install -y curl gnupg"]);
    }

    #[test]
    fn test_install_pinned_formats_versions() {
        let runner = RecordingRunner::new();
        install_pinned(&runner, &["nvidia-container-toolkit"], "1.17.8-1").unwrap();

        let calls = runner.calls();
        assert_eq!(
            calls,
            vec!["apt-get install -y nvidia-container-toolkit=1.17.8-1"]
        );
    }

    #[test]
    fn test_print_architecture_trims_output() {
        let runner = RecordingRunner::with_stdout("amd64\n");
        assert_eq!(print_architecture(&runner).unwrap(), "amd64");
    }

    #[test]
    fn test_print_architecture_rejects_empty() {
        let runner = RecordingRunner::new();
        assert!(print_architecture(&runner).is_err());
    }
}
