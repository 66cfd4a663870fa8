//! Container engine stage.
//!
//! Registers the Docker repository for the host's release and architecture,
//! installs the engine packages, grants the invoking user docker-group
//! membership and brings the daemon up.

use anyhow::{Context, Result};
use hostops::runner::{CommandRunner, CommandSpec};
use hostops::{apt, fetch, keyring, service, Platform};
use tracing::info;

use crate::config::{self, ProvisionConfig};
use crate::stages::{remove_file, remove_tree};

/// Install and start the Docker engine.
///
/// # Errors
///
/// Returns an error on the first failing command.
pub fn install(
    runner: &dyn CommandRunner,
    config: &ProvisionConfig,
    platform: &Platform,
) -> Result<()> {
    let arch = apt::print_architecture(runner)?;

    let key = fetch::fetch_text(runner, &format!("{}/gpg", config::DOCKER_REPO_BASE))?;
    keyring::dearmor_to(runner, &config.docker_keyring(), &key)?;

    let list = format!(
        "deb [arch={arch} signed-by={}] {} {} stable\n",
        config.docker_keyring().display(),
        config::DOCKER_REPO_BASE,
        platform.codename
    );
    keyring::write_source_list(&config.docker_list(), &list)?;

    apt::update(runner)?;
    apt::install(runner, config::DOCKER_PACKAGES)?;

    if let Some(user) = &config.target_user {
        runner
            .run(&CommandSpec::new("usermod").args(["-aG", "docker", user]))
            .with_context(|| format!("Failed to add {user} to the docker group"))?;
    } else {
        info!("no invoking user detected; skipping docker group membership");
    }

    service::enable_now(runner, "docker")
}

/// Purge engine packages and state directories. Invoked best-effort on
/// teardown.
///
/// # Errors
///
/// Returns an error if a removal command fails; filesystem removals that
/// find nothing succeed.
pub fn remove(runner: &dyn CommandRunner, config: &ProvisionConfig) -> Result<()> {
    apt::purge(runner, config::DOCKER_PACKAGES)?;

    for dir in &config.docker_state_dirs {
        remove_tree(dir)?;
    }
    remove_file(&config.docker_keyring())?;
    keyring::remove_source_list(&config.docker_list())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_config, test_platform, ScriptedRunner};

    #[test]
    fn test_install_writes_codename_keyed_source_list() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let runner = ScriptedRunner::provisioning_defaults();
        install(&runner, &config, &test_platform("24.04", "noble")).unwrap();

        let list = std::fs::read_to_string(config.docker_list()).unwrap();
        assert!(list.contains("arch=amd64"));
        assert!(list.contains("noble stable"));
        assert!(list.contains(&format!("signed-by={}", config.docker_keyring().display())));
    }

    #[test]
    fn test_install_adds_invoking_user_to_group() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.target_user = Some("dev".to_string());

        let runner = ScriptedRunner::provisioning_defaults();
        install(&runner, &config, &test_platform("24.04", "noble")).unwrap();

        assert!(runner.invoked("usermod -aG docker dev"));
        assert!(runner.invoked("systemctl enable --now docker"));
    }

    #[test]
    fn test_install_without_invoking_user_skips_usermod() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let runner = ScriptedRunner::provisioning_defaults();
        install(&runner, &config, &test_platform("24.04", "noble")).unwrap();

        assert!(!runner.invoked("usermod"));
    }

    #[test]
    fn test_remove_clears_state_dirs_and_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.docker_state_dirs = vec![dir.path().join("var-lib-docker")];

        std::fs::create_dir_all(&config.docker_state_dirs[0]).unwrap();
        keyring::write_source_list(&config.docker_list(), "deb ...\n").unwrap();

        let runner = ScriptedRunner::new();
        remove(&runner, &config).unwrap();

        assert!(!config.docker_state_dirs[0].exists());
        assert!(!config.docker_list().exists());
    }
}
