//! xcodebuild invocation for Apple targets

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::BuildType;
use crate::exec::subprocess::{CommandLine, CommandResult};
use crate::utils::{terminal, tools};

/// Scheme-less target CMake generates for building everything
const ALL_BUILD_TARGET: &str = "ALL_BUILD";

/// Find the `.xcodeproj` CMake generated in `build_dir`
pub fn find_xcode_project(build_dir: &Path) -> Option<PathBuf> {
    // Metacharacters in the directory itself must match literally
    let dir = glob::Pattern::escape(&build_dir.to_string_lossy());
    let pattern = Path::new(&dir).join("*.xcodeproj");
    let mut projects: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .ok()?
        .filter_map(|entry| entry.ok())
        .collect();
    projects.sort();
    projects.into_iter().next()
}

/// `xcodebuild clean build [-project <p>] -configuration <type> -target ALL_BUILD ...`
///
/// Without a project, xcodebuild picks the single project in its working
/// directory.
pub fn build_command(build_dir: &Path, project: Option<&Path>, build_type: BuildType) -> CommandLine {
    let mut cmd = CommandLine::new("xcodebuild")
        .args(["clean", "build"])
        .current_dir(build_dir);

    if let Some(project) = project {
        let name = project.file_name().map(PathBuf::from).unwrap_or_else(|| project.to_path_buf());
        cmd = cmd.arg("-project").arg(name);
    }

    cmd.arg("-configuration")
        .arg(build_type.to_string())
        .args(["-target", ALL_BUILD_TARGET])
        .arg("DEBUG_INFORMATION_FORMAT=dwarf-with-dsym")
        .arg("-UseModernBuildSystem=NO")
}

/// Build the generated Xcode project
pub fn build(build_dir: &Path, build_type: BuildType, verbose: bool) -> Result<CommandResult> {
    tools::require_tool("xcodebuild", "building Xcode projects")?;

    let project = find_xcode_project(build_dir);
    let cmd = build_command(build_dir, project.as_deref(), build_type);
    if verbose {
        terminal::print_command(&cmd);
    } else {
        println!("{}", cmd);
    }

    cmd.run_inherit().context("Failed to run xcodebuild")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_build_command_with_project() {
        let cmd = build_command(
            Path::new("/work/build/osx"),
            Some(Path::new("/work/build/osx/demo.xcodeproj")),
            BuildType::Debug,
        );
        assert_eq!(
            cmd.to_string(),
            "xcodebuild clean build -project demo.xcodeproj -configuration Debug \
             -target ALL_BUILD DEBUG_INFORMATION_FORMAT=dwarf-with-dsym -UseModernBuildSystem=NO"
        );
        assert_eq!(cmd.working_dir(), Some(Path::new("/work/build/osx")));
    }

    #[test]
    fn test_build_command_without_project() {
        let args = build_command(Path::new("build"), None, BuildType::Release).arg_strings();
        assert!(!args.contains(&"-project".to_string()));
        assert!(args.contains(&"Release".to_string()));
    }

    #[test]
    fn test_find_xcode_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert_eq!(find_xcode_project(temp_dir.path()), None);

        fs::create_dir(temp_dir.path().join("demo.xcodeproj")).unwrap();
        fs::write(temp_dir.path().join("CMakeCache.txt"), "").unwrap();
        assert_eq!(
            find_xcode_project(temp_dir.path()),
            Some(temp_dir.path().join("demo.xcodeproj"))
        );
    }

    #[test]
    fn test_find_xcode_project_in_bracketed_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let build_dir = temp_dir.path().join("out[1]").join("osx");
        fs::create_dir_all(build_dir.join("demo.xcodeproj")).unwrap();

        assert_eq!(
            find_xcode_project(&build_dir),
            Some(build_dir.join("demo.xcodeproj"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_find_xcode_project_ignores_wildcards_in_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sibling = temp_dir.path().join("osx");
        fs::create_dir_all(sibling.join("other.xcodeproj")).unwrap();
        let build_dir = temp_dir.path().join("o?x*");
        fs::create_dir_all(&build_dir).unwrap();

        assert_eq!(find_xcode_project(&build_dir), None);
    }
}
