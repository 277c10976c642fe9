//! Error types and helpers for user-friendly error messages
//!
//! Fatal failures carry an actionable hint that `main` prints below the
//! error message.

use std::path::PathBuf;

use thiserror::Error;

use crate::build::platforms::{HostOs, Target};

/// Fatal bootstrap errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The target is accepted on this host but has no generator profile
    #[error("No generator configuration for target '{target}'")]
    UnsupportedTarget { target: Target, host: HostOs },

    /// Tool/executable not found
    #[error("Missing tool: {tool}")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// Build directory could not be created
    #[error("Can not create directory {}", path.display())]
    CreateBuildDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `cmake` project generation exited non-zero
    #[error("Generate project files failed for {target} (exit code: {})", format_exit_code(*exit_code))]
    GenerateFailed { target: Target, exit_code: Option<i32> },

    /// Build step exited non-zero
    #[error("Build project failed for {target} (exit code: {})", format_exit_code(*exit_code))]
    BuildFailed { target: Target, exit_code: Option<i32> },
}

fn format_exit_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

impl BootstrapError {
    /// Create a missing tool error
    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    /// Hint shown below the error message
    pub fn hint(&self) -> String {
        match self {
            BootstrapError::UnsupportedTarget { host, .. } => {
                let configured: Vec<&str> = host
                    .targets()
                    .iter()
                    .filter(|t| t.profile().is_some())
                    .map(|t| t.name())
                    .collect();
                format!(
                    "Targets with a generator configuration on this host: {}",
                    configured.join(", ")
                )
            }
            BootstrapError::MissingTool {
                required_for, hint, ..
            } => format!("Required for {}.\n{}", required_for, hint),
            BootstrapError::CreateBuildDir { source, .. } => format!(
                "{}. Check that --folder points to a writable location.",
                source
            ),
            BootstrapError::GenerateFailed { .. } => {
                "See the cmake output above. Stale generator state is cleared on every run, \
                 so re-running after fixing CMakeLists.txt is safe."
                    .to_string()
            }
            BootstrapError::BuildFailed { .. } => {
                "See the compiler output above. Re-run without --build to only regenerate \
                 project files."
                    .to_string()
            }
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);
        eprintln!("\n{} {}", style("HINT:").yellow().bold(), self.hint());
        eprintln!();
    }
}

/// Common error hints for missing tools
pub mod hints {
    /// Get hint for missing CMake
    pub fn cmake() -> &'static str {
        "Install CMake from https://cmake.org/ or use your package manager:\n\
         • macOS: brew install cmake\n\
         • Ubuntu: sudo apt install cmake\n\
         • Windows: winget install Kitware.CMake"
    }

    /// Get hint for missing Git
    pub fn git() -> &'static str {
        "Install Git from https://git-scm.com/ or use your package manager:\n\
         • macOS: brew install git\n\
         • Ubuntu: sudo apt install git\n\
         • Windows: winget install Git.Git"
    }

    /// Get hint for missing Xcode
    pub fn xcode() -> &'static str {
        "Install Xcode from the App Store, then run: sudo xcode-select --install"
    }

    /// Hint for a tool this module has no specific advice for
    pub fn generic(tool: &str) -> String {
        format!("Make sure '{}' is installed and available in PATH.", tool)
    }
}
