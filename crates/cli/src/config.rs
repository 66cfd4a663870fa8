//! Provisioning configuration.
//!
//! Pinned package versions and repository endpoints live here as named
//! constants so they can be bumped without touching pipeline logic.
//! [`ProvisionConfig`] carries the filesystem layout and per-run flags.

use std::path::{Path, PathBuf};

use hostops::fetch::RetryConfig;
use hostops::Platform;

/// NVIDIA driver metapackage installed from the Ubuntu archive.
pub const DRIVER_PACKAGE: &str = "nvidia-driver-580";

/// Kernel build prerequisites installed alongside the driver.
pub const DRIVER_PREREQ_PACKAGES: &[&str] = &["build-essential", "gcc", "dkms"];

/// CUDA toolkit metapackage from the NVIDIA repository.
pub const CUDA_TOOLKIT_PACKAGE: &str = "cuda-toolkit-12-8";

/// Base URL of the NVIDIA CUDA package mirrors.
pub const CUDA_REPO_BASE: &str = "https://developer.download.nvidia.com/compute/cuda/repos";

/// Keyring package that registers the CUDA repository and its signing key.
pub const CUDA_KEYRING_DEB: &str = "cuda-keyring_1.1-1_all.deb";

/// Base URL of the Docker package repository for Ubuntu.
pub const DOCKER_REPO_BASE: &str = "https://download.docker.com/linux/ubuntu";

/// Container engine packages.
pub const DOCKER_PACKAGES: &[&str] = &[
    "docker-ce",
    "docker-ce-cli",
    "containerd.io",
    "docker-buildx-plugin",
    "docker-compose-plugin",
];

/// Base URL of the NVIDIA container toolkit repository.
pub const NVIDIA_CONTAINER_REPO: &str = "https://nvidia.github.io/libnvidia-container";

/// Pinned NVIDIA container toolkit version.
pub const CONTAINER_TOOLKIT_VERSION: &str = "1.17.8-1";

/// Container toolkit packages, all installed at the pinned version.
pub const CONTAINER_TOOLKIT_PACKAGES: &[&str] = &[
    "nvidia-container-toolkit",
    "nvidia-container-toolkit-base",
    "libnvidia-container-tools",
    "libnvidia-container1",
];

/// Distribution the provisioner supports.
pub const SUPPORTED_DISTRO: &str = "ubuntu";

/// Ubuntu releases the pipeline is validated against.
pub const SUPPORTED_RELEASES: &[&str] = &["20.04", "22.04", "24.04"];

/// Log file name under the log directory.
pub const LOG_FILE_NAME: &str = "gpuhost.log";

/// Install record file name under the log directory.
pub const RECORD_FILE_NAME: &str = "install-record.json";

/// Default log directory.
#[must_use]
pub fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/gpuhost")
}

/// Filesystem layout and per-run flags for a provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Directory holding the log file and install record.
    pub log_dir: PathBuf,
    /// Path to the `os-release` file used for platform detection.
    pub os_release: PathBuf,
    /// Persisted environment file giving future shells the toolkit paths.
    pub profile_env_file: PathBuf,
    /// Directory for de-armored apt keyrings.
    pub apt_keyrings_dir: PathBuf,
    /// Directory holding apt source lists.
    pub sources_dir: PathBuf,
    /// Keyring file for the NVIDIA container toolkit repository.
    pub nvidia_ctk_keyring: PathBuf,
    /// Parent directory of the CUDA installation trees (`cuda*`).
    pub cuda_root: PathBuf,
    /// Container engine state directories removed on teardown.
    pub docker_state_dirs: Vec<PathBuf>,
    /// User added to the `docker` group after the engine install.
    pub target_user: Option<String>,
    /// Skip the CUDA toolkit stage.
    pub skip_toolkit: bool,
    /// Proceed on unsupported platform releases.
    pub force_platform: bool,
    /// Retry policy for the container toolkit signing-key fetch.
    pub fetch_retry: RetryConfig,
}

impl ProvisionConfig {
    /// Configuration with the standard system paths.
    ///
    /// The target user is taken from `SUDO_USER` when the process was
    /// elevated through sudo.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            log_dir: default_log_dir(),
            os_release: PathBuf::from("/etc/os-release"),
            profile_env_file: PathBuf::from("/etc/profile.d/cuda-env.sh"),
            apt_keyrings_dir: PathBuf::from("/etc/apt/keyrings"),
            sources_dir: PathBuf::from("/etc/apt/sources.list.d"),
            nvidia_ctk_keyring: PathBuf::from(
                "/usr/share/keyrings/nvidia-container-toolkit-keyring.gpg",
            ),
            cuda_root: PathBuf::from("/usr/local"),
            docker_state_dirs: vec![
                PathBuf::from("/var/lib/docker"),
                PathBuf::from("/var/lib/containerd"),
                PathBuf::from("/etc/docker"),
            ],
            target_user: std::env::var("SUDO_USER").ok().filter(|u| !u.is_empty()),
            skip_toolkit: false,
            force_platform: false,
            fetch_retry: RetryConfig::default(),
        }
    }

    /// Path of the append-only log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    /// Path of the install record.
    #[must_use]
    pub fn record_file(&self) -> PathBuf {
        self.log_dir.join(RECORD_FILE_NAME)
    }

    /// Keyring file for the Docker repository.
    #[must_use]
    pub fn docker_keyring(&self) -> PathBuf {
        self.apt_keyrings_dir.join("docker.gpg")
    }

    /// Source list for the Docker repository.
    #[must_use]
    pub fn docker_list(&self) -> PathBuf {
        self.sources_dir.join("docker.list")
    }

    /// Source list for the NVIDIA container toolkit repository.
    #[must_use]
    pub fn nvidia_ctk_list(&self) -> PathBuf {
        self.sources_dir.join("nvidia-container-toolkit.list")
    }

    /// Legacy CUDA source lists that conflict with the keyring package and
    /// are dropped before repository setup.
    #[must_use]
    pub fn legacy_cuda_lists(&self) -> Vec<PathBuf> {
        vec![
            self.sources_dir.join("cuda.list"),
            self.sources_dir.join("nvidia-ml.list"),
        ]
    }

    /// Whether the detected platform is on the supported allow-list.
    #[must_use]
    pub fn is_supported(&self, platform: &Platform) -> bool {
        platform.id == SUPPORTED_DISTRO
            && SUPPORTED_RELEASES.contains(&platform.version_id.as_str())
    }
}

/// Contents of the persisted toolkit environment file.
#[must_use]
pub fn profile_env_contents(cuda_root: &Path) -> String {
    let cuda_home = cuda_root.join("cuda");
    format!(
        "export PATH={bin}${{PATH:+:${{PATH}}}}\n\
         export LD_LIBRARY_PATH={lib}${{LD_LIBRARY_PATH:+:${{LD_LIBRARY_PATH}}}}\n",
        bin = cuda_home.join("bin").display(),
        lib = cuda_home.join("lib64").display(),
    )
}
