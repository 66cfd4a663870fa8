//! Install and teardown stage definitions.
//!
//! Each stage performs one or more privileged external operations through
//! the [`hostops::CommandRunner`] seam. On the install path any internal
//! failure propagates to the pipeline driver, which aborts the run; the
//! teardown counterparts are invoked best-effort by the driver.

use std::path::Path;

use anyhow::{Context, Result};

pub mod driver;
pub mod engine;
pub mod repo;
pub mod shim;
pub mod toolkit;

/// Remove a directory tree. Succeeds when the tree is already absent.
pub(crate) fn remove_tree(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove {}", path.display()))
}

/// Remove a single file. Succeeds when the file is already absent.
pub(crate) fn remove_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove {}", path.display()))
}
