// Git queries used while bootstrapping: submodule sync and the HEAD commit

use std::path::Path;

use crate::build::StepOutcome;
use crate::exec::subprocess::{command_exists, CommandLine};
use crate::utils::terminal;

/// `git submodule update --init --recursive` in `source_dir`
pub fn submodule_update_command(source_dir: &Path) -> CommandLine {
    CommandLine::new("git")
        .args(["submodule", "update", "--init", "--recursive"])
        .current_dir(source_dir)
}

/// Sync submodules. Never fails; the outcome says whether it happened.
///
/// In verbose mode git's output goes straight to the terminal, otherwise
/// it is captured behind a spinner and only shown when git fails.
pub fn update_submodules(source_dir: &Path, verbose: bool) -> StepOutcome {
    if !command_exists("git") {
        return StepOutcome::Skipped("git not found in PATH".to_string());
    }

    let cmd = submodule_update_command(source_dir);
    let result = if verbose {
        terminal::print_command(&cmd);
        cmd.run_inherit()
    } else {
        let spinner = terminal::create_spinner("Updating git submodules...");
        let result = cmd.run_captured();
        spinner.finish_and_clear();
        result
    };

    match result {
        Ok(r) if r.success => StepOutcome::Applied("submodules up to date".to_string()),
        Ok(r) => {
            let detail = r.stderr.trim();
            if detail.is_empty() {
                StepOutcome::Skipped(format!("git exited with {:?}", r.exit_code))
            } else {
                StepOutcome::Skipped(detail.to_string())
            }
        }
        Err(e) => StepOutcome::Skipped(format!("{:#}", e)),
    }
}

/// Full hash of the latest commit (`git log -1 --pretty=%H`)
pub fn head_commit(source_dir: &Path) -> Option<String> {
    let result = CommandLine::new("git")
        .args(["log", "-1", "--pretty=%H"])
        .current_dir(source_dir)
        .run_captured()
        .ok()?;

    if !result.success {
        return None;
    }

    let commit = result.stdout.lines().next()?.trim().to_string();
    if commit.is_empty() {
        None
    } else {
        Some(commit)
    }
}
