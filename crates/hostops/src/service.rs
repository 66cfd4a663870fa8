//! Service manager operations.

use anyhow::{Context, Result};

use crate::runner::{CommandRunner, CommandSpec};

/// Restart a systemd unit.
///
/// # Errors
///
/// Returns an error if `systemctl restart` fails.
pub fn restart(runner: &dyn CommandRunner, unit: &str) -> Result<()> {
    runner
        .run(&CommandSpec::new("systemctl").args(["restart", unit]))
        .with_context(|| format!("Failed to restart {unit}"))?;
    Ok(())
}

/// Enable a systemd unit and start it immediately.
///
/// # Errors
///
/// Returns an error if `systemctl enable --now` fails.
pub fn enable_now(runner: &dyn CommandRunner, unit: &str) -> Result<()> {
    runner
        .run(&CommandSpec::new("systemctl").args(["enable", "--now", unit]))
        .with_context(|| format!("Failed to enable {unit}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RecordingRunner;

    #[test]
    fn test_restart_targets_unit() {
        let runner = RecordingRunner::new();
        restart(&runner, "docker").unwrap();
        assert_eq!(runner.calls(), vec!["systemctl restart docker"]);
    }

    #[test]
    fn test_enable_now_targets_unit() {
        let runner = RecordingRunner::new();
        enable_now(&runner, "docker").unwrap();
        assert_eq!(runner.calls(), vec!["systemctl enable --now docker"]);
    }
}
