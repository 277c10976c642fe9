//! bootstrap - generate and optionally build native CMake projects
//!
//! Selects a CMake generator and cache entries for the requested target
//! platform, stamps the source tree's version file with the current commit,
//! and drives `cmake` (or `xcodebuild`) inside `<folder>/<target>`.
//!
//! ## Architecture
//!
//! ```text
//! cli → build::runner → git / cmake / xcodebuild
//! ```

mod build;
mod cli;
mod error;
mod exec;
mod utils;
mod version;

use build::platforms::HostOs;
use cli::Cli;
use error::BootstrapError;
use utils::terminal;

fn main() {
    let host = HostOs::current();
    let cli = Cli::parse_for(host);

    if let Err(err) = cli.execute(host) {
        match err.downcast_ref::<BootstrapError>() {
            Some(e) => e.display_with_hints(),
            None => terminal::print_error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}
