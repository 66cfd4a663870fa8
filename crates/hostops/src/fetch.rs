//! Secure remote fetches with bounded retry.
//!
//! Downloads go through `curl` as an opaque collaborator. Network fetches
//! that gate later package installs can be wrapped in [`with_retry`], which
//! makes a fixed number of attempts with a fixed pause between them and
//! turns exhaustion into a hard error.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::runner::{CommandRunner, CommandSpec};

/// Bounded retry policy for network fetches.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts before giving up.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

/// Run `f` until it succeeds or all attempts are used up.
///
/// # Errors
///
/// Returns the final error, annotated with the attempt count, once all
/// attempts have failed.
pub fn with_retry<T, F>(config: &RetryConfig, operation_name: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        match f() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= config.max_attempts {
                    return Err(e)
                        .with_context(|| format!("{operation_name} failed after {attempt} attempts"));
                }

                warn!(
                    "{operation_name} failed (attempt {attempt}/{}): {e:#}. Retrying in {:?}...",
                    config.max_attempts, config.delay
                );
                std::thread::sleep(config.delay);
            }
        }
    }
}

/// Download a URL to a local file.
///
/// # Errors
///
/// Returns an error if `curl` fails.
pub fn fetch_to_file(runner: &dyn CommandRunner, url: &str, dest: &Path) -> Result<()> {
    runner
        .run(
            &CommandSpec::new("curl")
                .args(["-fsSL", "-o"])
                .arg(dest.display().to_string())
                .arg(url),
        )
        .with_context(|| format!("Failed to download {url}"))?;
    Ok(())
}

/// Fetch a URL and return its body as text.
///
/// # Errors
///
/// Returns an error if `curl` fails.
pub fn fetch_text(runner: &dyn CommandRunner, url: &str) -> Result<String> {
    let output = runner
        .run(&CommandSpec::new("curl").arg("-fsSL").arg(url))
        .with_context(|| format!("Failed to fetch {url}"))?;
    Ok(output.stdout)
}
