//! Tool detection with actionable errors when tools are missing

use std::path::PathBuf;

use anyhow::Result;
use which::which;

use crate::error::{hints, BootstrapError};
use crate::exec::subprocess::CommandLine;

/// Locate a required tool, or fail with an install hint
pub fn require_tool(tool_name: &str, required_for: &str) -> Result<PathBuf> {
    match which(tool_name) {
        Ok(path) => Ok(path),
        Err(_) => Err(BootstrapError::missing_tool(tool_name, required_for, tool_hint(tool_name)).into()),
    }
}

/// Install hint for a tool
pub fn tool_hint(tool_name: &str) -> String {
    match tool_name {
        "cmake" => hints::cmake().to_string(),
        "git" => hints::git().to_string(),
        "xcodebuild" => hints::xcode().to_string(),
        other => hints::generic(other),
    }
}

/// CMake version, parsed from the first line of `cmake --version`
pub fn cmake_version() -> Option<String> {
    let result = CommandLine::new("cmake").arg("--version").run_captured().ok()?;
    if !result.success {
        return None;
    }
    parse_cmake_version(&result.stdout)
}

fn parse_cmake_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("cmake version "))
        .map(|v| v.trim().to_string())
}
