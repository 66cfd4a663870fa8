//! GPU Developer Host Provisioning Library.
//!
//! Programmatic access to the provisioning pipelines behind the `gpuhost`
//! binary: a fixed install pipeline (driver, vendor repository, CUDA
//! toolkit, Docker engine, NVIDIA container toolkit) executed fail-fast,
//! and a best-effort teardown pipeline.
//!
//! # Example
//!
//! ```ignore
//! use gpuhost_cli::{ProvisionConfig, Provisioner};
//! use hostops::SystemRunner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ProvisionConfig::with_defaults();
//!     let runner = SystemRunner;
//!     Provisioner::new(config, &runner).install().await
//! }
//! ```

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]
// Allow async functions that don't use await (pipelines are sequential)
#![allow(clippy::unused_async)]

pub mod commands;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod record;
pub mod stages;
pub mod ui;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at the crate root
pub use config::ProvisionConfig;
pub use orchestrator::Provisioner;
pub use record::{InstallRecord, StageId};
