//! Subprocess execution for git, cmake and xcodebuild

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Result of a subprocess execution
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,

    /// Captured standard output (empty when output was inherited)
    pub stdout: String,

    /// Captured standard error (empty when output was inherited)
    pub stderr: String,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
        }
    }
}

/// A program invocation that can be displayed before it is run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command in `dir` instead of the current directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[cfg(test)]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments as lossy strings
    #[cfg(test)]
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[cfg(test)]
    pub fn working_dir(&self) -> Option<&std::path::Path> {
        self.cwd.as_deref()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run with stdin, stdout and stderr inherited from this process
    pub fn run_inherit(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let status = self
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        Ok(CommandResult::from_status(
            status,
            String::new(),
            String::new(),
            start.elapsed(),
        ))
    }

    /// Run and capture stdout/stderr
    pub fn run_captured(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = self
            .to_command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        Ok(CommandResult::from_status(
            output.status,
            stdout,
            stderr,
            start.elapsed(),
        ))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_display_quotes_whitespace() {
        let cmd = CommandLine::new("cmake")
            .arg("/src")
            .arg("-G")
            .arg("Unix Makefiles")
            .arg("-DLINUX=ON");
        assert_eq!(cmd.to_string(), "cmake /src -G \"Unix Makefiles\" -DLINUX=ON");
    }

    #[test]
    fn test_display_quotes_empty_argument() {
        let cmd = CommandLine::new("xcodebuild").args(["-project", ""]);
        assert_eq!(cmd.to_string(), "xcodebuild -project \"\"");
    }

    #[test]
    fn test_builder_records_working_dir() {
        let cmd = CommandLine::new("git").args(["log", "-1"]).current_dir("/tmp/src");
        assert_eq!(cmd.program(), "git");
        assert_eq!(cmd.arg_strings(), vec!["log", "-1"]);
        assert_eq!(cmd.working_dir(), Some(Path::new("/tmp/src")));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captured_reports_exit_code() {
        let result = CommandLine::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .run_captured()
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_inherit_reports_exit_code() {
        let result = CommandLine::new("sh")
            .args(["-c", "exit 4"])
            .run_inherit()
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(4));
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let result = CommandLine::new("definitely-not-a-real-program-1f3a").run_captured();
        assert!(result.is_err());
        assert!(!command_exists("definitely-not-a-real-program-1f3a"));
    }
}
