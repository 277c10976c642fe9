//! Project generation and build orchestration
//!
//! ```text
//! cli → BootstrapConfig → runner → git / cmake / xcodebuild
//! ```
//!
//! ## Modules
//!
//! - `platforms` - Target table (generator + cache entries per platform)
//! - `cmake` - CMake configure and build command lines
//! - `xcode` - xcodebuild command line for Apple targets
//! - `runner` - The sequential bootstrap steps

pub mod cmake;
pub mod platforms;
pub mod runner;
pub mod xcode;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use platforms::Target;

/// Name of the CMake cache file removed before every generation
pub const CMAKE_CACHE_FILE: &str = "CMakeCache.txt";

/// Name of the record written into the build directory after generation
pub const BOOTSTRAP_INFO_FILE: &str = "bootstrap_info.json";

/// CMake build type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
}

impl BuildType {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            BuildType::Debug
        } else {
            BuildType::Release
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Debug => write!(f, "Debug"),
            BuildType::Release => write!(f, "Release"),
        }
    }
}

/// Outcome of a best-effort step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step changed something; the string describes what
    Applied(String),
    /// The step did nothing; the string says why
    Skipped(String),
}

#[cfg(test)]
impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped(_))
    }
}

/// Resolved run parameters, fixed for the duration of a run
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Target platform
    pub target: Target,
    /// Source directory (where CMakeLists.txt and the version file live)
    pub source_dir: PathBuf,
    /// `<folder>/<target>` resolved against the source directory
    pub build_dir: PathBuf,
    /// Debug or Release
    pub build_type: BuildType,
    /// Run the build tool after generation
    pub build: bool,
    /// Windows `/maxcpucount` value; zero or negative passes none
    pub compiler_cores: i64,
    /// `ANDROID_NDK_HOME`, recorded but not used by any generator profile
    pub android_ndk: Option<PathBuf>,
    /// Echo commands before running them
    pub verbose: bool,
}

impl BootstrapConfig {
    pub fn new(target: Target, source_dir: PathBuf, folder: &Path, debug: bool) -> Self {
        let build_dir = source_dir.join(folder).join(target.name());
        Self {
            target,
            source_dir,
            build_dir,
            build_type: BuildType::from_debug_flag(debug),
            build: false,
            compiler_cores: 1,
            android_ndk: None,
            verbose: false,
        }
    }

    pub fn cmake_cache_file(&self) -> PathBuf {
        self.build_dir.join(CMAKE_CACHE_FILE)
    }

    pub fn version_file(&self) -> PathBuf {
        self.source_dir.join(crate::version::VERSION_FILE)
    }
}

/// Number of processors listed in `/proc/cpuinfo`, falling back to the
/// standard library's estimate on hosts without procfs
pub fn host_cpu_count() -> usize {
    std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .map(|info| count_cpuinfo_processors(&info))
        .filter(|&n| n > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        })
}

fn count_cpuinfo_processors(cpuinfo: &str) -> usize {
    cpuinfo
        .lines()
        .filter(|line| {
            line.split(':')
                .next()
                .map(|key| key.trim() == "processor")
                .unwrap_or(false)
        })
        .count()
}

/// Record of a bootstrap run, written as JSON into the build directory
#[derive(Debug, Serialize, Deserialize)]
pub struct BootstrapInfo {
    pub target: String,
    pub generator: String,
    pub build_type: BuildType,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Stamped version, when the version file was updated this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmake_version: Option<String>,
    pub tool_version: String,
    pub generated_at: String,
}
