//! Apt keyring and source-list management.
//!
//! Covers the key-management side of repository setup: de-armoring vendor
//! signing keys into binary keyring files, writing source lists, and the
//! `signed-by` rewrite applied to vendor-published list files.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use crate::runner::{CommandRunner, CommandSpec};

/// De-armor an ASCII signing key into a binary keyring file.
///
/// The key text is staged in a temp file because `gpg --dearmor` reads a
/// file argument, not the captured-stdin channel the runner provides.
///
/// # Errors
///
/// Returns an error if the staging file cannot be written or `gpg` fails.
pub fn dearmor_to(runner: &dyn CommandRunner, keyring: &Path, ascii_key: &str) -> Result<()> {
    if let Some(parent) = keyring.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let staging = std::env::temp_dir().join(format!("gpuhost-key-{nanos}.asc"));
    std::fs::write(&staging, ascii_key)
        .with_context(|| format!("Failed to stage signing key at {}", staging.display()))?;

    let result = runner
        .run(
            &CommandSpec::new("gpg")
                .args(["--dearmor", "--yes", "-o"])
                .arg(keyring.display().to_string())
                .arg(staging.display().to_string()),
        )
        .with_context(|| format!("Failed to write keyring {}", keyring.display()));

    // Best-effort cleanup.
    let _ = std::fs::remove_file(&staging);

    result.map(|_| ())
}

/// Write an apt source list, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_source_list(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write source list {}", path.display()))
}

/// Remove an apt source list. Succeeds when the file is already absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn remove_source_list(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove source list {}", path.display()))
}

/// Rewrite active `deb …` lines of a vendor-published source list to pin
/// the signing keyring via `signed-by`. Comments and lines that already
/// carry options pass through unchanged.
#[must_use]
pub fn rewrite_signed_by(list: &str, keyring: &Path) -> String {
    let mut rewritten = String::with_capacity(list.len());
    for line in list.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("deb ") && !trimmed.contains("signed-by") {
            let indent = &line[..line.len() - trimmed.len()];
            let rest = &trimmed["deb ".len()..];
            rewritten.push_str(&format!(
                "{indent}deb [signed-by={}] {rest}",
                keyring.display()
            ));
        } else {
            rewritten.push_str(line);
        }
        rewritten.push('\n');
    }
    rewritten
}
