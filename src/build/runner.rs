//! Sequential bootstrap steps
//!
//! Order: resolve profile, sync submodules, stamp version, prepare build
//! directory, drop stale CMake cache, generate, record, optionally build.
//! Nothing is rolled back when a later step fails.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use super::cmake::{CMakeConfig, NativeParallelism};
use super::platforms::{HostOs, PlatformProfile, TargetFamily};
use super::{host_cpu_count, xcode, BootstrapConfig, BootstrapInfo, StepOutcome, BOOTSTRAP_INFO_FILE};
use crate::error::BootstrapError;
use crate::utils::{git, terminal};
use crate::version;

/// What the best-effort steps did during a successful run
#[derive(Debug)]
pub struct RunReport {
    pub submodules: StepOutcome,
    pub version: StepOutcome,
    pub build_dir: StepOutcome,
    pub cache: StepOutcome,
    pub built: bool,
}

/// Runs the bootstrap steps for one configuration
pub struct Bootstrapper {
    config: BootstrapConfig,
    host: HostOs,
}

impl Bootstrapper {
    pub fn new(config: BootstrapConfig, host: HostOs) -> Self {
        Self { config, host }
    }

    /// Generator profile of the configured target
    pub fn resolve_profile(&self) -> Result<&'static PlatformProfile, BootstrapError> {
        self.config
            .target
            .profile()
            .ok_or(BootstrapError::UnsupportedTarget {
                target: self.config.target,
                host: self.host,
            })
    }

    /// Execute every step in order
    pub fn run(&self) -> Result<RunReport> {
        let config = &self.config;
        let profile = self.resolve_profile()?;

        if config.verbose {
            self.print_summary(profile);
        }

        let submodules = git::update_submodules(&config.source_dir, config.verbose);
        if let StepOutcome::Skipped(reason) = &submodules {
            terminal::print_warning(&format!("Submodule update skipped: {}", reason));
        }

        let version = self.stamp_version();
        match &version {
            StepOutcome::Applied(v) => terminal::print_info(&format!("Version stamped: {}", v)),
            StepOutcome::Skipped(reason) if config.verbose => {
                terminal::print_info(&format!("Version stamp skipped: {}", reason))
            }
            StepOutcome::Skipped(_) => {}
        }

        let build_dir = prepare_build_dir(&config.build_dir)?;

        let cache = remove_stale_cache(&config.cmake_cache_file());
        if let StepOutcome::Applied(path) = &cache {
            terminal::print_info(&format!("remove cmake cache file: {}", path));
        }

        let parallelism = if config.build {
            NativeParallelism::for_target(config.target, config.compiler_cores, host_cpu_count)
        } else {
            None
        };
        let cmake = CMakeConfig::from_profile(
            profile,
            config.source_dir.clone(),
            config.build_dir.clone(),
        )
        .build_type(config.build_type)
        .parallelism(parallelism)
        .verbose(config.verbose);

        let result = cmake.configure()?;
        if config.verbose {
            eprintln!("cmake finished in {:.2}s", result.duration.as_secs_f64());
        }
        if !result.success {
            return Err(BootstrapError::GenerateFailed {
                target: config.target,
                exit_code: result.exit_code,
            }
            .into());
        }

        if let Err(e) = self.write_info(profile, &version) {
            terminal::print_warning(&format!("{:#}", e));
        }

        if config.build {
            let result = match config.target.family() {
                TargetFamily::Apple => {
                    xcode::build(&config.build_dir, config.build_type, config.verbose)?
                }
                _ => cmake.build()?,
            };
            if config.verbose {
                eprintln!("build finished in {:.2}s", result.duration.as_secs_f64());
            }
            if !result.success {
                return Err(BootstrapError::BuildFailed {
                    target: config.target,
                    exit_code: result.exit_code,
                }
                .into());
            }
        }

        terminal::print_success("run complete!");

        Ok(RunReport {
            submodules,
            version,
            build_dir,
            cache,
            built: config.build,
        })
    }

    fn stamp_version(&self) -> StepOutcome {
        let source_dir = &self.config.source_dir;
        version::stamp_version_file(&self.config.version_file(), || git::head_commit(source_dir))
            .unwrap_or_else(|e| StepOutcome::Skipped(format!("{:#}", e)))
    }

    fn write_info(&self, profile: &PlatformProfile, version: &StepOutcome) -> Result<()> {
        let config = &self.config;
        let info = BootstrapInfo {
            target: config.target.to_string(),
            generator: profile.generator.to_string(),
            build_type: config.build_type,
            source_dir: config.source_dir.clone(),
            build_dir: config.build_dir.clone(),
            version: match version {
                StepOutcome::Applied(v) => Some(v.clone()),
                StepOutcome::Skipped(_) => None,
            },
            cmake_version: crate::utils::tools::cmake_version(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Local::now().to_rfc3339(),
        };

        let path = config.build_dir.join(BOOTSTRAP_INFO_FILE);
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize bootstrap info")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn print_summary(&self, profile: &PlatformProfile) {
        let config = &self.config;
        eprintln!("Target:     {} ({})", config.target, profile.generator);
        eprintln!("Source:     {}", config.source_dir.display());
        eprintln!("Build dir:  {}", config.build_dir.display());
        eprintln!("Build type: {}", config.build_type);
        if let Some(ndk) = &config.android_ndk {
            eprintln!("Android NDK: {} (not used by any generator profile)", ndk.display());
        }
    }
}

/// Create the build directory and its parents. An existing directory is
/// fine; any other failure is fatal.
pub fn prepare_build_dir(path: &Path) -> Result<StepOutcome, BootstrapError> {
    if path.is_dir() {
        return Ok(StepOutcome::Skipped(format!("{} already exists", path.display())));
    }

    match fs::create_dir_all(path) {
        Ok(()) => Ok(StepOutcome::Applied(path.display().to_string())),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(
            StepOutcome::Skipped(format!("{} already exists", path.display())),
        ),
        Err(source) => Err(BootstrapError::CreateBuildDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Delete a stale `CMakeCache.txt`. Never fails.
pub fn remove_stale_cache(cache_file: &Path) -> StepOutcome {
    match fs::remove_file(cache_file) {
        Ok(()) => StepOutcome::Applied(cache_file.display().to_string()),
        Err(e) => StepOutcome::Skipped(format!("{}: {}", cache_file.display(), e)),
    }
}
