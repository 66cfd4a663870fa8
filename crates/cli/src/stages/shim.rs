//! GPU container runtime shim stage.
//!
//! Installs the NVIDIA container toolkit at its pinned version, registers
//! the runtime with Docker and probes that registration took. The signing
//! key fetch is the one network operation with a bounded retry; exhausting
//! it is fatal and precedes every package install of this stage.

use anyhow::{bail, Context, Result};
use hostops::runner::{CommandRunner, CommandSpec};
use hostops::{apt, fetch, keyring, service};

use crate::config::{self, ProvisionConfig};
use crate::stages::remove_file;

/// Install the container toolkit, register the runtime and verify it.
///
/// # Errors
///
/// Returns an error on the first failing command, on retry exhaustion of
/// the key fetch, or if the verification probe does not see the runtime.
pub fn install(runner: &dyn CommandRunner, config: &ProvisionConfig) -> Result<()> {
    let key = fetch::with_retry(
        &config.fetch_retry,
        "Container toolkit signing-key fetch",
        || fetch::fetch_text(runner, &format!("{}/gpgkey", config::NVIDIA_CONTAINER_REPO)),
    )?;
    keyring::dearmor_to(runner, &config.nvidia_ctk_keyring, &key)?;

    let list = fetch::fetch_text(
        runner,
        &format!(
            "{}/stable/deb/nvidia-container-toolkit.list",
            config::NVIDIA_CONTAINER_REPO
        ),
    )?;
    let list = keyring::rewrite_signed_by(&list, &config.nvidia_ctk_keyring);
    keyring::write_source_list(&config.nvidia_ctk_list(), &list)?;

    apt::update(runner)?;
    apt::install_pinned(
        runner,
        config::CONTAINER_TOOLKIT_PACKAGES,
        config::CONTAINER_TOOLKIT_VERSION,
    )?;

    runner
        .run(&CommandSpec::new("nvidia-ctk").args(["runtime", "configure", "--runtime=docker"]))
        .context("Failed to register the nvidia runtime with Docker")?;
    service::restart(runner, "docker")?;

    verify_runtime(runner)
}

/// Purge toolkit packages, keyring and source list. Invoked best-effort on
/// teardown.
///
/// # Errors
///
/// Returns an error if the purge command fails; filesystem removals that
/// find nothing succeed.
pub fn remove(runner: &dyn CommandRunner, config: &ProvisionConfig) -> Result<()> {
    apt::purge(runner, config::CONTAINER_TOOLKIT_PACKAGES)?;
    remove_file(&config.nvidia_ctk_keyring)?;
    keyring::remove_source_list(&config.nvidia_ctk_list())?;
    Ok(())
}

fn verify_runtime(runner: &dyn CommandRunner) -> Result<()> {
    let output = runner
        .run(&CommandSpec::new("docker").args(["info", "--format", "{{json .Runtimes}}"]))
        .context("Failed to query Docker runtimes")?;

    if !output.stdout.contains("nvidia") {
        bail!("The nvidia runtime is not registered with Docker after configuration");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_config, ScriptedRunner};

    #[test]
    fn test_install_pins_every_toolkit_package() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let runner = ScriptedRunner::provisioning_defaults();
        install(&runner, &config).unwrap();

        for package in config::CONTAINER_TOOLKIT_PACKAGES {
            assert!(runner.invoked(&format!("{package}={}", config::CONTAINER_TOOLKIT_VERSION)));
        }
        assert!(runner.invoked("nvidia-ctk runtime configure --runtime=docker"));
        assert!(runner.invoked("systemctl restart docker"));
    }

    #[test]
    fn test_key_fetch_exhaustion_blocks_package_install() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let runner = ScriptedRunner::provisioning_defaults().fail_on("gpgkey", 22);
        let err = install(&runner, &config).unwrap_err();

        assert!(err.to_string().contains("after 5 attempts"));
        let attempts = runner
            .calls()
            .iter()
            .filter(|line| line.contains("gpgkey"))
            .count();
        assert_eq!(attempts, 5);
        assert!(!runner.invoked("apt-get install"));
        assert!(!runner.invoked("nvidia-ctk"));
    }

    #[test]
    fn test_missing_runtime_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        // Probe output without the nvidia runtime.
        let runner = ScriptedRunner::provisioning_defaults()
            .stdout_for("docker info", r#"{"io.containerd.runc.v2":{"path":"runc"}}"#);
        let err = install(&runner, &config).unwrap_err();

        assert!(err.to_string().contains("not registered"));
    }
}
