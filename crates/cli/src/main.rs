//! GPU Developer Host Provisioning CLI.
//!
//! Provisions an Ubuntu host for GPU development: NVIDIA kernel driver,
//! CUDA toolkit, Docker engine and the NVIDIA container toolkit, with a
//! symmetric best-effort teardown.

use clap::{Parser, Subcommand};
use hostops::CommandError;

use gpuhost_cli::commands::install::InstallCommand;
use gpuhost_cli::commands::uninstall::UninstallCommand;
use gpuhost_cli::{config, logging, ui};

/// gpuhost - GPU developer host provisioning.
#[derive(Parser)]
#[command(
    name = "gpuhost",
    version,
    about = "Provision an Ubuntu host for GPU development",
    long_about = "Provision an Ubuntu host for GPU development.\n\n\
                  Installs the NVIDIA kernel driver, the CUDA toolkit, the Docker\n\
                  engine and the NVIDIA container toolkit in a fixed pipeline that\n\
                  stops on the first failure. Teardown removes every artifact\n\
                  category best-effort and is safe to re-run."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the GPU host stack (driver, CUDA toolkit, Docker, container toolkit).
    Install(InstallCommand),

    /// Remove every provisioned artifact, best-effort.
    Uninstall(UninstallCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_path = match logging::init(&config::default_log_dir(), cli.verbose) {
        Ok(path) => path,
        Err(err) => {
            ui::print_error(&format!("Failed to initialise logging: {err:#}"));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Install(cmd) => cmd.run().await,
        Commands::Uninstall(cmd) => cmd.run().await,
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        ui::print_error(&format!("{err:#}"));
        ui::print_info(&format!("Full log: {}", log_path.display()));
        std::process::exit(exit_code_for(&err));
    }
}

/// Exit with the failing command's own status when one is known.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CommandError>())
        .and_then(CommandError::exit_code)
        .unwrap_or(1)
}
