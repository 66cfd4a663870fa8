use anyhow::Result;
use clap::Args;
use hostops::SystemRunner;

use crate::config::ProvisionConfig;
use crate::orchestrator::Provisioner;
use crate::ui;
use crate::validator::PrerequisitesValidator;

/// Provision the GPU developer host stack.
#[derive(Args)]
pub struct InstallCommand {
    /// Skip the CUDA toolkit stage.
    #[arg(long = "no-cuda")]
    no_cuda: bool,

    /// Proceed on unsupported platform releases (with a warning).
    #[arg(long)]
    force: bool,
}

impl InstallCommand {
    /// Run the install pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if prerequisites are unmet or a stage fails.
    pub async fn run(&self) -> Result<()> {
        ui::print_section("GPU Developer Host Provisioning");

        let validator = PrerequisitesValidator::new();
        validator.validate()?;

        let mut config = ProvisionConfig::with_defaults();
        config.skip_toolkit = self.no_cuda;
        config.force_platform = self.force;

        let runner = SystemRunner;
        Provisioner::new(config, &runner).install().await
    }
}
