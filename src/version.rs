//! Version file stamping
//!
//! The `version` file at the source root starts with `MAJOR.MINOR.PATCH`.
//! Each run rewrites it to `MAJOR.MINOR.PATCH.<commit>`, where `<commit>`
//! is the first 8 characters of the HEAD commit hash. Because only the
//! leading numeric part is matched, a previously stamped file is
//! re-stamped rather than growing another suffix.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::build::StepOutcome;

/// Name of the version file at the source root
pub const VERSION_FILE: &str = "version";

/// Length of the commit hash prefix appended to the version
pub const COMMIT_PREFIX_LEN: usize = 8;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{1,3}").expect("version pattern is valid")
    })
}

/// Leading `MAJOR.MINOR.PATCH` of a line, if present
pub fn match_base_version(line: &str) -> Option<&str> {
    version_pattern().find(line).map(|m| m.as_str())
}

/// Build the stamped version string
pub fn stamped_version(base: &str, commit: &str) -> String {
    let prefix: String = commit.chars().take(COMMIT_PREFIX_LEN).collect();
    format!("{}.{}", base, prefix)
}

/// Stamp the version file at `path`.
///
/// `resolve_commit` is only called when the first line matches. The file
/// is left untouched whenever the outcome is `Skipped`.
pub fn stamp_version_file<F>(path: &Path, resolve_commit: F) -> Result<StepOutcome>
where
    F: FnOnce() -> Option<String>,
{
    if !path.is_file() {
        return Ok(StepOutcome::Skipped(format!(
            "{} not found",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let first_line = contents.split('\n').next().unwrap_or_default();

    let Some(base) = match_base_version(first_line) else {
        return Ok(StepOutcome::Skipped(format!(
            "first line of {} is not a MAJOR.MINOR.PATCH version",
            path.display()
        )));
    };

    let Some(commit) = resolve_commit() else {
        return Ok(StepOutcome::Skipped(
            "could not determine the current git commit".to_string(),
        ));
    };

    let mut new_contents = stamped_version(base, &commit);
    if contents.contains('\n') {
        new_contents.push('\n');
    }

    fs::write(path, &new_contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(StepOutcome::Applied(new_contents.trim_end().to_string()))
}
