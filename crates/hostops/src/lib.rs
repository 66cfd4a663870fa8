//! Privileged host operations for GPU developer host provisioning.
//!
//! This crate wraps the external tools the provisioner drives — the package
//! manager, the secure-fetch tool, the key-management tool and the service
//! manager — behind a small [`runner::CommandRunner`] seam so the pipelines
//! that sequence them can be exercised without touching the host.
//!
//! # Example
//!
//! ```rust,ignore
//! use hostops::runner::SystemRunner;
//! use hostops::{apt, platform};
//!
//! fn main() -> anyhow::Result<()> {
//!     let runner = SystemRunner;
//!     let platform = platform::detect("/etc/os-release".as_ref())?;
//!     println!("provisioning {} {}", platform.id, platform.version_id);
//!     apt::update(&runner)?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod apt;
pub mod fetch;
pub mod keyring;
pub mod platform;
pub mod runner;
pub mod service;

pub use platform::Platform;
pub use runner::{CommandError, CommandOutput, CommandRunner, CommandSpec, SystemRunner};
