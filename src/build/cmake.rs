//! CMake configuration and execution
//!
//! This module builds the `cmake` command lines for the generate and build
//! steps and runs them inside the build directory.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::platforms::{CacheEntry, PlatformProfile, Target, TargetFamily};
use super::BuildType;
use crate::exec::subprocess::{CommandLine, CommandResult};
use crate::utils::{terminal, tools};

/// Parallelism flags forwarded to the native build tool after `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeParallelism {
    /// make-style `-j<N>`
    Jobs(usize),
    /// MSBuild `/maxcpucount:<N>`
    MaxCpuCount(u32),
}

impl NativeParallelism {
    /// Flags for `target`, or `None` when its build tool gets no extra flags.
    ///
    /// `host_cpus` is only evaluated for Unix-family targets. A zero or
    /// negative `compiler_cores` leaves MSBuild at its own default.
    pub fn for_target(
        target: Target,
        compiler_cores: i64,
        host_cpus: impl FnOnce() -> usize,
    ) -> Option<Self> {
        match target.family() {
            TargetFamily::Unix => Some(NativeParallelism::Jobs(host_cpus())),
            TargetFamily::Windows => u32::try_from(compiler_cores)
                .ok()
                .filter(|&n| n > 0)
                .map(NativeParallelism::MaxCpuCount),
            _ => None,
        }
    }

    fn native_args(&self) -> [String; 2] {
        let flag = match self {
            NativeParallelism::Jobs(n) => format!("-j{}", n),
            NativeParallelism::MaxCpuCount(n) => format!("/maxcpucount:{}", n),
        };
        ["--".to_string(), flag]
    }
}

/// CMake configuration builder
#[derive(Debug, Default)]
pub struct CMakeConfig {
    /// Source directory (where CMakeLists.txt is located)
    source_dir: PathBuf,
    /// Build directory, also the working directory of every cmake call
    build_dir: PathBuf,
    /// Build type
    build_type: BuildType,
    /// CMake variables (-D options), in command-line order
    variables: Vec<CacheEntry>,
    /// Generator (e.g. "Unix Makefiles", "Xcode")
    generator: Option<String>,
    /// Native build tool parallelism
    parallelism: Option<NativeParallelism>,
    /// Echo commands before running them
    verbose: bool,
}

impl CMakeConfig {
    /// Create a new CMake configuration
    pub fn new(source_dir: PathBuf, build_dir: PathBuf) -> Self {
        Self {
            source_dir,
            build_dir,
            ..Default::default()
        }
    }

    /// Configuration for a platform profile: its generator and cache entries
    pub fn from_profile(profile: &PlatformProfile, source_dir: PathBuf, build_dir: PathBuf) -> Self {
        Self::new(source_dir, build_dir)
            .generator(profile.generator)
            .cache_entries(profile.options)
    }

    /// Set the build type
    pub fn build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    /// Append the cache entries of a platform profile
    pub fn cache_entries(mut self, entries: &[CacheEntry]) -> Self {
        self.variables.extend_from_slice(entries);
        self
    }

    /// Set the generator
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    /// Set native build tool parallelism
    pub fn parallelism(mut self, parallelism: Option<NativeParallelism>) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// `cmake <source> -G <generator> -D<var>=<value>... -DCMAKE_BUILD_TYPE=<type>`
    pub fn configure_command(&self) -> CommandLine {
        let mut cmd = CommandLine::new("cmake")
            .arg(&self.source_dir)
            .current_dir(&self.build_dir);

        if let Some(generator) = &self.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        for entry in &self.variables {
            cmd = cmd.arg(entry.to_definition());
        }

        cmd.arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type))
    }

    /// `cmake --build . --config <type> [-- <parallelism>]`
    pub fn build_command(&self) -> CommandLine {
        let mut cmd = CommandLine::new("cmake")
            .args(["--build", ".", "--config"])
            .arg(self.build_type.to_string())
            .current_dir(&self.build_dir);

        if let Some(parallelism) = &self.parallelism {
            cmd = cmd.args(parallelism.native_args());
        }

        cmd
    }

    /// Run CMake configure step
    pub fn configure(&self) -> Result<CommandResult> {
        tools::require_tool("cmake", "project generation")?;

        let cmd = self.configure_command();
        println!("Use this cmake command to generate project files: {}", cmd);

        cmd.run_inherit().context("Failed to run CMake configure")
    }

    /// Run CMake build step
    pub fn build(&self) -> Result<CommandResult> {
        tools::require_tool("cmake", "building the generated project")?;

        let cmd = self.build_command();
        if self.verbose {
            terminal::print_command(&cmd);
        } else {
            println!("{}", cmd);
        }

        cmd.run_inherit().context("Failed to run CMake build")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn linux_config(build_type: BuildType) -> CMakeConfig {
        CMakeConfig::from_profile(
            Target::Linux.profile().unwrap(),
            PathBuf::from("/work/src"),
            PathBuf::from("/work/src/build/linux"),
        )
        .build_type(build_type)
    }

    #[test]
    fn test_configure_command_linux_release() {
        let cmd = linux_config(BuildType::Release).configure_command();
        assert_eq!(cmd.program(), "cmake");
        assert_eq!(
            cmd.arg_strings(),
            vec![
                "/work/src",
                "-G",
                "Unix Makefiles",
                "-DCMAKE_C_FLAGS=-fPIC",
                "-DCMAKE_CXX_FLAGS=-fPIC",
                "-DCMAKE_SHARED_LINKER_FLAGS=-Wl,-Bsymbolic",
                "-DLINUX=ON",
                "-DCMAKE_BUILD_TYPE=Release",
            ]
        );
        assert_eq!(cmd.working_dir(), Some(Path::new("/work/src/build/linux")));
    }

    #[test]
    fn test_configure_command_matches_profile_for_every_target() {
        for target in Target::ALL {
            let Some(profile) = target.profile() else {
                continue;
            };
            for debug in [false, true] {
                let build_type = BuildType::from_debug_flag(debug);
                let args = CMakeConfig::from_profile(
                    profile,
                    PathBuf::from("src"),
                    PathBuf::from("build"),
                )
                .build_type(build_type)
                .configure_command()
                .arg_strings();

                let mut expected = vec!["src".to_string(), "-G".to_string(), profile.generator.to_string()];
                expected.extend(profile.options.iter().map(|o| o.to_definition()));
                expected.push(format!("-DCMAKE_BUILD_TYPE={}", build_type));
                assert_eq!(args, expected, "target {}", target);
            }
        }
    }

    #[test]
    fn test_configure_command_debug() {
        let cmd = linux_config(BuildType::Debug).configure_command();
        assert_eq!(
            cmd.arg_strings().last().map(String::as_str),
            Some("-DCMAKE_BUILD_TYPE=Debug")
        );
        assert!(cmd.to_string().contains("-G \"Unix Makefiles\""));
    }

    #[test]
    fn test_appended_cache_entries_precede_build_type() {
        let args = linux_config(BuildType::Release)
            .cache_entries(Target::Unix.profile().unwrap().options)
            .configure_command()
            .arg_strings();
        let n = args.len();
        assert_eq!(args[n - 2], "-DUNIX=ON");
        assert_eq!(args[n - 1], "-DCMAKE_BUILD_TYPE=Release");
    }

    #[test]
    fn test_build_command_unix_jobs() {
        let cmd = linux_config(BuildType::Release)
            .parallelism(NativeParallelism::for_target(Target::Linux, 1, || 8))
            .build_command();
        assert_eq!(cmd.to_string(), "cmake --build . --config Release -- -j8");
    }

    #[test]
    fn test_build_command_windows_maxcpucount() {
        let cmd = CMakeConfig::new(PathBuf::from("src"), PathBuf::from("build/win64"))
            .build_type(BuildType::Debug)
            .parallelism(NativeParallelism::for_target(Target::Win64, 12, || unreachable!()))
            .build_command();
        assert_eq!(
            cmd.to_string(),
            "cmake --build . --config Debug -- /maxcpucount:12"
        );
    }

    #[test]
    fn test_parallelism_per_family() {
        assert_eq!(
            NativeParallelism::for_target(Target::Unix, 0, || 4),
            Some(NativeParallelism::Jobs(4))
        );
        assert_eq!(NativeParallelism::for_target(Target::Win, 0, || 4), None);
        assert_eq!(NativeParallelism::for_target(Target::Win64, -1, || 4), None);
        assert_eq!(
            NativeParallelism::for_target(Target::Win64, i64::MAX, || 4),
            None
        );
        assert_eq!(NativeParallelism::for_target(Target::Osx, 12, || 4), None);
        assert_eq!(NativeParallelism::for_target(Target::Hisiv500, 12, || 4), None);
    }

    #[test]
    fn test_build_command_without_parallelism() {
        let cmd = CMakeConfig::new(PathBuf::from("src"), PathBuf::from("build"))
            .build_command();
        assert_eq!(cmd.to_string(), "cmake --build . --config Release");
    }
}
