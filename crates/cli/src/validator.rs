//! Prerequisite validation.
//!
//! The pipeline assumes an already-elevated execution context and a handful
//! of host tools. Both are checked up front, before any side effect.

use std::process::Command;

use anyhow::Result;
use colored::Colorize;

use crate::ui;

/// Host tools every pipeline run drives.
const REQUIRED_TOOLS: &[&str] = &["apt-get", "dpkg", "curl", "gpg", "systemctl"];

/// Validates prerequisites before a run.
pub struct PrerequisitesValidator {
    requirements: Vec<Requirement>,
}

struct Requirement {
    name: String,
    check: Box<dyn Fn() -> Result<bool>>,
    remedy: String,
}

impl PrerequisitesValidator {
    #[must_use]
    pub fn new() -> Self {
        let mut requirements = Vec::new();

        requirements.push(Requirement {
            name: "Elevated privileges".to_string(),
            check: Box::new(|| {
                let output = Command::new("id").arg("-u").output()?;
                Ok(output.status.success()
                    && String::from_utf8_lossy(&output.stdout).trim() == "0")
            }),
            remedy: "Re-run under sudo or as root".to_string(),
        });

        for tool in REQUIRED_TOOLS {
            requirements.push(Requirement {
                name: tool.to_string(),
                check: Box::new(move || Ok(which::which(tool).is_ok())),
                remedy: format!("Install {tool} and ensure it is on PATH"),
            });
        }

        Self { requirements }
    }

    /// Run every check, printing a per-requirement result line.
    ///
    /// # Errors
    ///
    /// Returns an error if any requirement is unmet.
    pub fn validate(&self) -> Result<()> {
        println!();
        let mut failures = Vec::new();

        for requirement in &self.requirements {
            if let Ok(true) = (requirement.check)() {
                ui::print_check_result(&requirement.name, true, None);
            } else {
                ui::print_check_result(&requirement.name, false, None);
                failures.push(requirement);
            }
        }

        println!();

        if failures.is_empty() {
            ui::print_success("All prerequisites met");
            return Ok(());
        }

        ui::print_warning("Some prerequisites are not met:");
        println!();
        for failure in &failures {
            println!(
                "  {} {} - {}",
                "✗".red(),
                failure.name.red(),
                failure.remedy.bright_black()
            );
        }
        println!();

        Err(anyhow::anyhow!(
            "Prerequisites not met. Address the items above and try again."
        ))
    }
}

impl Default for PrerequisitesValidator {
    fn default() -> Self {
        Self::new()
    }
}
