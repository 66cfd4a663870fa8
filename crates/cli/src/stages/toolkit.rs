//! CUDA toolkit stage.
//!
//! Installs the pinned toolkit metapackage and writes the persisted
//! environment file so future shells pick up the toolkit paths. The stage
//! is complete only once both have succeeded.

use anyhow::{Context, Result};
use hostops::apt;
use hostops::runner::CommandRunner;

use crate::config::{self, profile_env_contents, ProvisionConfig};
use crate::stages::{remove_file, remove_tree};

/// Install the toolkit package and write the environment file.
///
/// # Errors
///
/// Returns an error on the first failing command or a failed file write.
pub fn install(runner: &dyn CommandRunner, config: &ProvisionConfig) -> Result<()> {
    apt::install(runner, &[config::CUDA_TOOLKIT_PACKAGE])?;

    let env_file = &config.profile_env_file;
    if let Some(parent) = env_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(env_file, profile_env_contents(&config.cuda_root))
        .with_context(|| format!("Failed to write {}", env_file.display()))?;

    Ok(())
}

/// Remove toolkit packages, installed trees, the environment file and the
/// repository registration. Invoked best-effort on teardown.
///
/// # Errors
///
/// Returns an error if a removal command fails; filesystem removals that
/// find nothing succeed.
pub fn remove(runner: &dyn CommandRunner, config: &ProvisionConfig) -> Result<()> {
    apt::purge(runner, &["^cuda-.*", "cuda-keyring"])?;

    for tree in cuda_trees(config)? {
        remove_tree(&tree)?;
    }
    remove_file(&config.profile_env_file)?;

    for list in config.legacy_cuda_lists() {
        hostops::keyring::remove_source_list(&list)?;
    }

    Ok(())
}

/// Installed CUDA trees under the configured root (`cuda`, `cuda-12.8`, …).
fn cuda_trees(config: &ProvisionConfig) -> Result<Vec<std::path::PathBuf>> {
    let root = &config.cuda_root;
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut trees = Vec::new();
    for entry in std::fs::read_dir(root)
        .with_context(|| format!("Failed to list {}", root.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
        if entry.file_name().to_string_lossy().starts_with("cuda") {
            trees.push(entry.path());
        }
    }
    Ok(trees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedRunner;

    #[test]
    fn test_install_writes_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::test_support::test_config(dir.path());
        config.profile_env_file = dir.path().join("profile.d/cuda-env.sh");

        let runner = ScriptedRunner::new();
        install(&runner, &config).unwrap();

        let contents = std::fs::read_to_string(&config.profile_env_file).unwrap();
        assert!(contents.contains("LD_LIBRARY_PATH"));
        assert!(runner.invoked(config::CUDA_TOOLKIT_PACKAGE));
    }

    #[test]
    fn test_remove_deletes_cuda_trees_and_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::test_support::test_config(dir.path());
        config.cuda_root = dir.path().join("usr-local");
        config.profile_env_file = dir.path().join("profile.d/cuda-env.sh");

        std::fs::create_dir_all(config.cuda_root.join("cuda-12.8")).unwrap();
        std::fs::create_dir_all(config.cuda_root.join("cuda")).unwrap();
        std::fs::create_dir_all(config.cuda_root.join("bin")).unwrap();
        std::fs::create_dir_all(config.profile_env_file.parent().unwrap()).unwrap();
        std::fs::write(&config.profile_env_file, "export PATH=...").unwrap();

        let runner = ScriptedRunner::new();
        remove(&runner, &config).unwrap();

        assert!(!config.cuda_root.join("cuda-12.8").exists());
        assert!(!config.cuda_root.join("cuda").exists());
        assert!(config.cuda_root.join("bin").exists());
        assert!(!config.profile_env_file.exists());
    }
}
