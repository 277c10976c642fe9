//! CLI argument parsing using clap derive macros
//!
//! The accepted targets and the `--cpu_compile_cores` option depend on the
//! host OS, so the derived command is adjusted per host by
//! [`Cli::command_for`] before parsing.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::{PossibleValue, PossibleValuesParser, TypedValueParser};
use clap::error::ErrorKind;
use clap::{value_parser, Arg, CommandFactory, FromArgMatches, Parser};

use crate::build::platforms::{HostOs, Target};
use crate::build::runner::{Bootstrapper, RunReport};
use crate::build::{BootstrapConfig, StepOutcome};
use crate::utils::terminal;

/// Argument id of the Windows-only core count option
pub const CPU_COMPILE_CORES: &str = "cpu_compile_cores";

/// Default `--cpu_compile_cores` on Windows hosts
pub const DEFAULT_COMPILE_CORES: i64 = 12;

/// Generate the project files for the current platform.
#[derive(Parser, Debug)]
#[command(name = "bootstrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// On the current platform, the types that can be built
    #[arg(value_parser = TargetParser::for_host(HostOs::current()))]
    pub target: Target,

    /// The build folder, relative to the project directory
    #[arg(long, default_value = "build")]
    pub folder: PathBuf,

    /// Build after project files are generated
    #[arg(long)]
    pub build: bool,

    /// Enable Debug build
    #[arg(long)]
    pub debug: bool,

    /// Android NDK location
    #[arg(long, env = "ANDROID_NDK_HOME", hide = true)]
    pub android_ndk: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Filled from `--cpu_compile_cores` on Windows hosts. Zero or a
    /// negative count means no `/maxcpucount`.
    #[arg(skip)]
    pub cpu_compile_cores: Option<i64>,
}

/// Accepts only the targets offered on one host
#[derive(Debug, Clone)]
pub struct TargetParser {
    choices: &'static [Target],
}

impl TargetParser {
    pub fn for_host(host: HostOs) -> Self {
        Self {
            choices: host.targets(),
        }
    }
}

impl TypedValueParser for TargetParser {
    type Value = Target;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let names: Vec<&'static str> = self.choices.iter().map(|t| t.name()).collect();
        let name = PossibleValuesParser::new(names).parse_ref(cmd, arg, value)?;
        name.parse::<Target>()
            .map_err(|_| clap::Error::new(ErrorKind::InvalidValue).with_cmd(cmd))
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        Some(Box::new(
            self.choices.iter().map(|t| PossibleValue::new(t.name())),
        ))
    }
}

impl Cli {
    /// The clap command as offered on `host`
    pub fn command_for(host: HostOs) -> clap::Command {
        let cmd = <Self as CommandFactory>::command()
            .mut_arg("target", |arg| arg.value_parser(TargetParser::for_host(host)));

        if host.has_core_count_option() {
            cmd.arg(
                Arg::new(CPU_COMPILE_CORES)
                    .long(CPU_COMPILE_CORES)
                    .value_name("N")
                    .value_parser(value_parser!(i64))
                    .allow_negative_numbers(true)
                    .default_value("12")
                    .help("Specifies the number of compiled cores"),
            )
        } else {
            cmd
        }
    }

    /// Parse `args` as the CLI would on `host`
    pub fn try_parse_for<I, T>(host: HostOs, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cmd = Self::command_for(host);
        let matches = cmd.try_get_matches_from_mut(args)?;
        let mut cli = Self::from_arg_matches(&matches).map_err(|e| e.format(&mut cmd))?;
        if host.has_core_count_option() {
            cli.cpu_compile_cores = matches.get_one::<i64>(CPU_COMPILE_CORES).copied();
        }
        Ok(cli)
    }

    /// Parse the process arguments, exiting with usage on error
    pub fn parse_for(host: HostOs) -> Self {
        Self::try_parse_for(host, std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Resolve the run configuration relative to `source_dir`
    pub fn into_config(self, host: HostOs, source_dir: PathBuf) -> BootstrapConfig {
        let mut config = BootstrapConfig::new(self.target, source_dir, &self.folder, self.debug);
        config.build = self.build;
        config.compiler_cores = if host.has_core_count_option() {
            self.cpu_compile_cores.unwrap_or(DEFAULT_COMPILE_CORES)
        } else {
            1
        };
        config.android_ndk = self.android_ndk;
        config.verbose = self.verbose;
        config
    }

    /// Execute the bootstrap run
    pub fn execute(self, host: HostOs) -> Result<()> {
        if self.no_color {
            terminal::disable_colors();
        }

        let source_dir = std::env::current_dir().context("Failed to get current directory")?;
        let verbose = self.verbose;
        let config = self.into_config(host, source_dir);

        let report = Bootstrapper::new(config, host).run()?;
        if verbose {
            print_report(&report);
        }

        Ok(())
    }
}

fn print_report(report: &RunReport) {
    let steps = [
        ("submodules", &report.submodules),
        ("version", &report.version),
        ("build dir", &report.build_dir),
        ("cmake cache", &report.cache),
    ];
    for (name, outcome) in steps {
        match outcome {
            StepOutcome::Applied(detail) => eprintln!("  {:<12} applied: {}", name, detail),
            StepOutcome::Skipped(reason) => eprintln!("  {:<12} skipped: {}", name, reason),
        }
    }
    eprintln!("  {:<12} {}", "build", if report.built { "done" } else { "not requested" });
}
