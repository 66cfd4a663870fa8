//! Shared test doubles and fixtures.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use hostops::fetch::RetryConfig;
use hostops::platform;
use hostops::runner::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use hostops::Platform;

use crate::config::ProvisionConfig;

/// A `CommandRunner` scripted per test: every command succeeds with empty
/// output unless a rule says otherwise, and every rendered command line is
/// recorded for assertions.
pub struct ScriptedRunner {
    calls: Mutex<Vec<String>>,
    failures: Vec<(String, i32)>,
    outputs: Vec<(String, String)>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// A runner pre-seeded with the probe outputs a healthy provisioning
    /// run expects.
    pub fn provisioning_defaults() -> Self {
        Self::new()
            .stdout_for("uname -r", "6.8.0-45-generic\n")
            .stdout_for("--print-architecture", "amd64\n")
            .stdout_for(
                "docker info",
                r#"{"io.containerd.runc.v2":{"path":"runc"},"nvidia":{"path":"nvidia-container-runtime"}}"#,
            )
    }

    /// Fail any command whose rendered line contains `needle` with the
    /// given exit code.
    pub fn fail_on(mut self, needle: &str, code: i32) -> Self {
        self.failures.push((needle.to_string(), code));
        self
    }

    /// Answer any command whose rendered line contains `needle` with the
    /// given stdout. Later rules override earlier ones.
    pub fn stdout_for(mut self, needle: &str, stdout: &str) -> Self {
        self.outputs.push((needle.to_string(), stdout.to_string()));
        self
    }

    /// All rendered command lines, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether any recorded command line contains `needle`.
    pub fn invoked(&self, needle: &str) -> bool {
        self.calls().iter().any(|line| line.contains(needle))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let line = spec.to_string();
        self.calls.lock().unwrap().push(line.clone());

        if let Some((_, code)) = self
            .failures
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
        {
            return Err(CommandError::Failed {
                program: spec.program().to_string(),
                code: Some(*code),
                stderr: "scripted failure".to_string(),
            });
        }

        let stdout = self
            .outputs
            .iter()
            .rev()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default();

        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

/// A configuration rooted under a test directory, with a supported
/// platform descriptor already in place and zero retry delay.
pub fn test_config(root: &Path) -> ProvisionConfig {
    let config = ProvisionConfig {
        log_dir: root.join("log"),
        os_release: root.join("os-release"),
        profile_env_file: root.join("profile.d/cuda-env.sh"),
        apt_keyrings_dir: root.join("keyrings"),
        sources_dir: root.join("sources.list.d"),
        nvidia_ctk_keyring: root.join("keyrings/nvidia-container-toolkit-keyring.gpg"),
        cuda_root: root.join("usr-local"),
        docker_state_dirs: vec![root.join("var-lib-docker"), root.join("etc-docker")],
        target_user: None,
        skip_toolkit: false,
        force_platform: false,
        fetch_retry: RetryConfig {
            max_attempts: 5,
            delay: Duration::ZERO,
        },
    };
    write_os_release(&config, "24.04", "noble");
    config
}

/// Overwrite the fixture's platform descriptor.
pub fn write_os_release(config: &ProvisionConfig, version: &str, codename: &str) {
    std::fs::write(
        &config.os_release,
        format!("ID=ubuntu\nVERSION_ID=\"{version}\"\nVERSION_CODENAME={codename}\n"),
    )
    .unwrap();
}

/// A parsed platform descriptor for direct stage tests.
pub fn test_platform(version: &str, codename: &str) -> Platform {
    platform::parse(&format!(
        "ID=ubuntu\nVERSION_ID=\"{version}\"\nVERSION_CODENAME={codename}\n"
    ))
    .unwrap()
}
