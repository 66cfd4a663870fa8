//! Host platform identification.
//!
//! The platform descriptor is resolved once at startup from `os-release`
//! and treated as read-only for the remainder of the run.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Resolved OS distribution identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Distribution id (e.g. `ubuntu`).
    pub id: String,
    /// Release version (e.g. `24.04`).
    pub version_id: String,
    /// Release codename (e.g. `noble`), used by codename-keyed apt sources.
    pub codename: String,
}

impl Platform {
    /// Repository path component used by the NVIDIA package mirrors,
    /// e.g. `ubuntu2404` for Ubuntu 24.04.
    #[must_use]
    pub fn repo_tag(&self) -> String {
        format!("{}{}", self.id, self.version_id.replace('.', ""))
    }
}

/// Read and parse the platform descriptor from an `os-release` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or lacks required fields.
pub fn detect(os_release: &Path) -> Result<Platform> {
    let contents = std::fs::read_to_string(os_release)
        .with_context(|| format!("Failed to read {}", os_release.display()))?;
    parse(&contents)
}

/// Parse `os-release` contents.
///
/// # Errors
///
/// Returns an error if `ID`, `VERSION_ID` or a codename field is missing.
pub fn parse(contents: &str) -> Result<Platform> {
    let mut id = None;
    let mut version_id = None;
    let mut codename = None;

    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim() {
            "ID" => id = Some(value),
            "VERSION_ID" => version_id = Some(value),
            // VERSION_CODENAME wins; UBUNTU_CODENAME is the fallback on
            // derivatives that only carry the upstream name.
            "VERSION_CODENAME" => codename = Some(value),
            "UBUNTU_CODENAME" => {
                if codename.is_none() {
                    codename = Some(value);
                }
            }
            _ => {}
        }
    }

    let Some(id) = id else {
        bail!("os-release is missing the ID field");
    };
    let Some(version_id) = version_id else {
        bail!("os-release is missing the VERSION_ID field");
    };
    let Some(codename) = codename else {
        bail!("os-release is missing a codename field");
    };

    Ok(Platform {
        id,
        version_id,
        codename,
    })
}
