//! Pipeline orchestration.
//!
//! [`Provisioner`] drives the install and teardown pipelines with two
//! distinct execution strategies: install short-circuits on the first
//! failing stage and surfaces the originating step, while teardown runs
//! every removal to completion and downgrades individual failures to
//! warnings.

use anyhow::{bail, Result};
use hostops::runner::CommandRunner;
use hostops::{apt, platform, Platform};
use tracing::{error, info, warn};

use crate::config::{self, ProvisionConfig};
use crate::record::{self, InstallRecord, StageId};
use crate::stages;
use crate::ui;

/// Total numbered steps shown during install.
const TOTAL_STEPS: u8 = 5;

/// Drives the provisioning pipelines.
pub struct Provisioner<'a> {
    config: ProvisionConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Provisioner<'a> {
    /// Create a provisioner over an already-elevated execution context.
    #[must_use]
    pub fn new(config: ProvisionConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Run the install pipeline to completion, fail-fast.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure, annotated with the originating
    /// stage. The platform gate aborts before any side effect unless the
    /// force flag is set.
    pub async fn install(&self) -> Result<()> {
        let platform = self.check_platform()?;

        let record_path = self.config.record_file();
        let mut record = InstallRecord::load(&record_path)?.unwrap_or_default();

        ui::print_progress_step(1, TOTAL_STEPS, StageId::Driver.description());
        self.run_stage(StageId::Driver, &mut record, || {
            stages::driver::install(self.runner)
        })?;

        ui::print_progress_step(2, TOTAL_STEPS, "NVIDIA package repository");
        info!("setting up the NVIDIA package repository");
        stages::repo::ensure_cuda_repo(self.runner, &self.config, &platform)?;

        if self.config.skip_toolkit {
            ui::print_progress_step(3, TOTAL_STEPS, "CUDA toolkit (skipped)");
            info!("toolkit stage skipped by flag");
        } else {
            ui::print_progress_step(3, TOTAL_STEPS, StageId::CudaToolkit.description());
            self.run_stage(StageId::CudaToolkit, &mut record, || {
                stages::toolkit::install(self.runner, &self.config)
            })?;
        }

        ui::print_progress_step(4, TOTAL_STEPS, StageId::ContainerEngine.description());
        self.run_stage(StageId::ContainerEngine, &mut record, || {
            stages::engine::install(self.runner, &self.config, &platform)
        })?;

        ui::print_progress_step(5, TOTAL_STEPS, StageId::ContainerToolkit.description());
        self.run_stage(StageId::ContainerToolkit, &mut record, || {
            stages::shim::install(self.runner, &self.config)
        })?;

        self.print_success_summary();
        Ok(())
    }

    /// Run the teardown pipeline to completion, best-effort.
    ///
    /// Removal failures are logged and swallowed so a partially-installed
    /// or already-clean host still tears down as far as possible.
    ///
    /// # Errors
    ///
    /// Never fails on individual removals; only an unexpected internal
    /// error would propagate.
    pub async fn uninstall(&self) -> Result<()> {
        ui::print_section("Removing the GPU host stack");

        self.best_effort("NVIDIA driver packages", stages::driver::remove(self.runner));
        self.best_effort(
            "CUDA toolkit artifacts",
            stages::toolkit::remove(self.runner, &self.config),
        );
        self.best_effort(
            "Docker engine artifacts",
            stages::engine::remove(self.runner, &self.config),
        );
        self.best_effort(
            "NVIDIA container toolkit artifacts",
            stages::shim::remove(self.runner, &self.config),
        );
        self.best_effort("unused dependencies", apt::autoremove(self.runner));
        self.best_effort(
            "install record",
            record::remove(&self.config.record_file()),
        );

        ui::print_success("Teardown complete.");
        info!("teardown complete");
        Ok(())
    }

    /// Resolve the platform and enforce the allow-list.
    fn check_platform(&self) -> Result<Platform> {
        let platform = platform::detect(&self.config.os_release)?;
        info!(
            id = %platform.id,
            version = %platform.version_id,
            codename = %platform.codename,
            "detected platform"
        );

        if self.config.is_supported(&platform) {
            return Ok(platform);
        }

        if self.config.force_platform {
            let message = format!(
                "{} {} is not on the supported release list; proceeding anyway (--force)",
                platform.id, platform.version_id
            );
            warn!("{message}");
            ui::print_warning(&message);
            return Ok(platform);
        }

        bail!(
            "Unsupported platform {} {} (supported: {} {}). Re-run with --force to override.",
            platform.id,
            platform.version_id,
            config::SUPPORTED_DISTRO,
            config::SUPPORTED_RELEASES.join(", ")
        )
    }

    /// Execute one recordable stage; append it to the record only after
    /// every side effect has completed.
    fn run_stage(
        &self,
        id: StageId,
        record: &mut InstallRecord,
        stage: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        info!(stage = id.as_str(), "starting stage");

        if let Err(err) = stage() {
            error!(stage = id.as_str(), error = %err, "stage failed");
            ui::print_error(&format!("{} failed: {err:#}", id.description()));
            ui::print_info(&format!(
                "Full log: {}",
                self.config.log_file().display()
            ));
            return Err(err.context(format!("{} stage failed", id.description())));
        }

        record.append(&self.config.record_file(), id)?;
        ui::print_success(&format!("{} installed", id.description()));
        Ok(())
    }

    fn best_effort(&self, what: &str, result: Result<()>) {
        match result {
            Ok(()) => info!("removed {what}"),
            Err(err) => {
                warn!("could not remove {what}: {err:#}");
                ui::print_warning(&format!("Could not remove {what}: {err:#}"));
            }
        }
    }

    fn print_success_summary(&self) {
        ui::print_section("Provisioning Complete!");
        ui::print_success("The GPU developer stack is installed.");
        ui::print_info(&format!("Log: {}", self.config.log_file().display()));
        ui::print_info(&format!(
            "Install record: {}",
            self.config.record_file().display()
        ));

        if !self.config.skip_toolkit {
            ui::print_info(&format!(
                "Toolkit paths take effect in new shells via {}",
                self.config.profile_env_file.display()
            ));
        }
        if self.config.target_user.is_some() {
            ui::print_info("Log out and back in for docker group membership to apply.");
        }
        ui::print_info("A reboot is recommended so the new kernel driver loads.");
    }
}
