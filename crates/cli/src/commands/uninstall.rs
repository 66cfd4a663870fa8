use anyhow::Result;
use clap::Args;
use hostops::SystemRunner;

use crate::config::ProvisionConfig;
use crate::orchestrator::Provisioner;
use crate::validator::PrerequisitesValidator;

/// Remove every provisioned artifact, best-effort.
#[derive(Args)]
pub struct UninstallCommand {}

impl UninstallCommand {
    /// Run the teardown pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error only if prerequisites are unmet; individual
    /// removal failures are swallowed.
    pub async fn run(&self) -> Result<()> {
        let validator = PrerequisitesValidator::new();
        validator.validate()?;

        let config = ProvisionConfig::with_defaults();
        let runner = SystemRunner;
        Provisioner::new(config, &runner).uninstall().await
    }
}
