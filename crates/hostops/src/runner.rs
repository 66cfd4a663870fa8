//! External command execution.
//!
//! Every privileged tool the provisioner touches is invoked through the
//! [`CommandRunner`] trait so pipeline code can be tested against a scripted
//! implementation. The real [`SystemRunner`] captures child output and
//! mirrors it into the tracing sinks.

use std::fmt;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// A fully-specified external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandSpec {
    /// Start building an invocation of `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Append a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// The program being invoked.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured output of a completed command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Failure modes of an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be launched at all.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("`{program}` {}", failure_detail(.code, .stderr))]
    Failed {
        /// Program that failed.
        program: String,
        /// Exit status code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
}

impl CommandError {
    /// The child's exit status code, when one exists.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } => None,
            Self::Failed { code, .. } => *code,
        }
    }
}

fn failure_detail(code: &Option<i32>, stderr: &str) -> String {
    let status = code.map_or_else(
        || "was terminated by a signal".to_string(),
        |c| format!("exited with status {c}"),
    );
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status
    } else {
        format!("{status}: {stderr}")
    }
}

/// The seam through which all external commands run.
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be launched or exits non-zero.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

/// Runs commands on the real host via `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        info!("+ {spec}");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        for (key, value) in &spec.envs {
            command.env(key, value);
        }

        let output = command.output().map_err(|source| CommandError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        // Mirror child output into the log sinks.
        if !stdout.trim().is_empty() {
            debug!("{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            debug!("{}", stderr.trim_end());
        }

        if !output.status.success() {
            return Err(CommandError::Failed {
                program: spec.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[cfg(test)]
pub(crate) struct RecordingRunner {
    pub calls: std::sync::Mutex<Vec<String>>,
    pub stdout: String,
}

#[cfg(test)]
impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            stdout: String::new(),
        }
    }

    pub fn with_stdout(stdout: &str) -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            stdout: stdout.to_string(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(spec.to_string());
        Ok(CommandOutput {
            stdout: self.stdout.clone(),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("apt-get")
            .args(["install", "-y"])
            .arg("curl");
        assert_eq!(spec.to_string(), "apt-get install -y curl");
    }

    #[test]
    fn test_system_runner_captures_stdout() {
        let output = SystemRunner
            .run(&CommandSpec::new("echo").arg("hello"))
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_system_runner_reports_exit_code() {
        let err = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "exit 7"]))
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(7));
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let err = SystemRunner
            .run(&CommandSpec::new("definitely-not-a-real-binary"))
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_failure_detail_includes_stderr() {
        let err = CommandError::Failed {
            program: "apt-get".into(),
            code: Some(100),
            stderr: "unable to locate package\n".into(),
        };
        let message = err.to_string();
        assert!(message.contains("status 100"));
        assert!(message.contains("unable to locate package"));
    }
}
