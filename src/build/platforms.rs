//! Target platforms and their CMake generator profiles
//!
//! The table is compiled in. Each [`Target`] maps to an optional
//! [`PlatformProfile`]; targets the CLI accepts but which have no profile
//! are rejected by the runner before anything touches the filesystem.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

/// Host operating system the tool is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl HostOs {
    /// Detect the host OS this binary was compiled for
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => HostOs::Windows,
            "linux" => HostOs::Linux,
            "macos" => HostOs::MacOs,
            _ => HostOs::Other,
        }
    }

    /// Targets that can be generated from this host
    pub fn targets(&self) -> &'static [Target] {
        match self {
            HostOs::Windows => &[Target::Win, Target::Win64],
            HostOs::Linux => &[Target::Linux, Target::Android, Target::Hisiv500],
            HostOs::MacOs => &[
                Target::Osx,
                Target::Ios,
                Target::Android,
                Target::Win,
                Target::Win64,
                Target::Linux,
                Target::Hisiv500,
            ],
            HostOs::Other => &[
                Target::Osx,
                Target::Win,
                Target::Win64,
                Target::Android,
                Target::Ios,
                Target::Linux,
                Target::Unix,
            ],
        }
    }

    /// Whether `--cpu_compile_cores` is offered on this host
    pub fn has_core_count_option(&self) -> bool {
        *self == HostOs::Windows
    }
}

/// Target platform for project generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Osx,
    Win,
    Win64,
    Linux,
    Android,
    Ios,
    Unix,
    Hisiv500,
}

/// Toolchain family of a target; selects the build tool and parallelism flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFamily {
    /// Built with xcodebuild
    Apple,
    /// Visual Studio generators, parallelism via `/maxcpucount`
    Windows,
    /// Makefile generators, parallelism via `-j`
    Unix,
    /// Vendor cross toolchains
    Embedded,
}

impl Target {
    pub const ALL: [Target; 8] = [
        Target::Osx,
        Target::Win,
        Target::Win64,
        Target::Linux,
        Target::Android,
        Target::Ios,
        Target::Unix,
        Target::Hisiv500,
    ];

    /// Name as accepted on the command line and used for the build subdirectory
    pub fn name(&self) -> &'static str {
        match self {
            Target::Osx => "osx",
            Target::Win => "win",
            Target::Win64 => "win64",
            Target::Linux => "linux",
            Target::Android => "android",
            Target::Ios => "ios",
            Target::Unix => "unix",
            Target::Hisiv500 => "hisiv500",
        }
    }

    pub fn family(&self) -> TargetFamily {
        match self {
            Target::Osx | Target::Ios => TargetFamily::Apple,
            Target::Win | Target::Win64 => TargetFamily::Windows,
            Target::Linux | Target::Unix | Target::Android => TargetFamily::Unix,
            Target::Hisiv500 => TargetFamily::Embedded,
        }
    }

    /// Generator profile for this target, if one is configured
    pub fn profile(&self) -> Option<&'static PlatformProfile> {
        match self {
            Target::Osx => Some(&OSX),
            Target::Win => Some(&WIN),
            Target::Win64 => Some(&WIN64),
            Target::Linux => Some(&LINUX),
            Target::Unix => Some(&UNIX),
            // No generator configuration exists for these yet; the Android
            // NDK toolchain file is not wired up.
            Target::Android | Target::Ios | Target::Hisiv500 => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Target::ALL.iter().find(|t| t.name() == s) {
            Some(target) => Ok(*target),
            None => bail!("Unknown target platform: '{}'", s),
        }
    }
}

/// A single `-DNAME=VALUE` cache entry passed to CMake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub name: &'static str,
    pub value: &'static str,
}

impl CacheEntry {
    const fn new(name: &'static str, value: &'static str) -> Self {
        Self { name, value }
    }

    /// Render as a CMake command-line definition
    pub fn to_definition(&self) -> String {
        format!("-D{}={}", self.name, self.value)
    }
}

/// CMake generator and cache entries for one target
#[derive(Debug, PartialEq, Eq)]
pub struct PlatformProfile {
    pub generator: &'static str,
    pub options: &'static [CacheEntry],
}

static OSX: PlatformProfile = PlatformProfile {
    generator: "Xcode",
    options: &[
        CacheEntry::new("CMAKE_OSX_SYSROOT", "macosx"),
        CacheEntry::new("CMAKE_OSX_ARCHITECTURES", "x86_64"),
        CacheEntry::new("MACOS", "ON"),
    ],
};

static WIN: PlatformProfile = PlatformProfile {
    generator: "Visual Studio 15 2017",
    options: &[CacheEntry::new("WIN32", "ON")],
};

static WIN64: PlatformProfile = PlatformProfile {
    generator: "Visual Studio 15 2017 Win64",
    options: &[CacheEntry::new("WIN64", "ON")],
};

static LINUX: PlatformProfile = PlatformProfile {
    generator: "Unix Makefiles",
    options: &[
        CacheEntry::new("CMAKE_C_FLAGS", "-fPIC"),
        CacheEntry::new("CMAKE_CXX_FLAGS", "-fPIC"),
        CacheEntry::new("CMAKE_SHARED_LINKER_FLAGS", "-Wl,-Bsymbolic"),
        CacheEntry::new("LINUX", "ON"),
    ],
};

static UNIX: PlatformProfile = PlatformProfile {
    generator: "Unix Makefiles",
    options: &[
        CacheEntry::new("CMAKE_C_FLAGS", "-fPIC"),
        CacheEntry::new("CMAKE_CXX_FLAGS", "-fPIC"),
        CacheEntry::new("CMAKE_SHARED_LINKER_FLAGS", "-Wl,-Bsymbolic"),
        CacheEntry::new("UNIX", "ON"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_name_roundtrip() {
        for target in Target::ALL {
            assert_eq!(target.name().parse::<Target>().unwrap(), target);
        }
        assert!("android64".parse::<Target>().is_err());
        assert!("Linux".parse::<Target>().is_err());
    }

    #[test]
    fn test_host_target_choices() {
        assert_eq!(HostOs::Windows.targets(), &[Target::Win, Target::Win64]);
        assert_eq!(
            HostOs::Linux.targets(),
            &[Target::Linux, Target::Android, Target::Hisiv500]
        );
        assert!(HostOs::MacOs.targets().contains(&Target::Osx));
        assert!(!HostOs::MacOs.targets().contains(&Target::Unix));
        assert!(HostOs::Other.targets().contains(&Target::Unix));
        assert!(!HostOs::Other.targets().contains(&Target::Hisiv500));
    }

    #[test]
    fn test_core_count_option_only_on_windows() {
        assert!(HostOs::Windows.has_core_count_option());
        assert!(!HostOs::Linux.has_core_count_option());
        assert!(!HostOs::MacOs.has_core_count_option());
        assert!(!HostOs::Other.has_core_count_option());
    }

    #[test]
    fn test_profiles() {
        let linux = Target::Linux.profile().unwrap();
        assert_eq!(linux.generator, "Unix Makefiles");
        assert_eq!(
            linux.options.iter().map(|o| o.to_definition()).collect::<Vec<_>>(),
            vec![
                "-DCMAKE_C_FLAGS=-fPIC",
                "-DCMAKE_CXX_FLAGS=-fPIC",
                "-DCMAKE_SHARED_LINKER_FLAGS=-Wl,-Bsymbolic",
                "-DLINUX=ON",
            ]
        );

        assert_eq!(Target::Osx.profile().unwrap().generator, "Xcode");
        assert_eq!(
            Target::Win64.profile().unwrap().generator,
            "Visual Studio 15 2017 Win64"
        );
        assert!(Target::Unix
            .profile()
            .unwrap()
            .options
            .contains(&CacheEntry::new("UNIX", "ON")));
    }

    #[test]
    fn test_unconfigured_targets_have_no_profile() {
        assert!(Target::Android.profile().is_none());
        assert!(Target::Ios.profile().is_none());
        assert!(Target::Hisiv500.profile().is_none());
    }

    #[test]
    fn test_families() {
        assert_eq!(Target::Osx.family(), TargetFamily::Apple);
        assert_eq!(Target::Ios.family(), TargetFamily::Apple);
        assert_eq!(Target::Win.family(), TargetFamily::Windows);
        assert_eq!(Target::Android.family(), TargetFamily::Unix);
        assert_eq!(Target::Unix.family(), TargetFamily::Unix);
        assert_eq!(Target::Hisiv500.family(), TargetFamily::Embedded);
    }
}
