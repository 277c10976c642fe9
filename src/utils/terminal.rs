//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{}: {}", style("success").green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{}: {}", style("info").blue().bold(), message);
}

/// Echo a command line before it runs (verbose mode)
pub fn print_command(command: &impl std::fmt::Display) {
    eprintln!("{} {}", style("Running:").dim(), command);
}

/// Create a spinner progress bar
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Disable ANSI styling on both output streams
pub fn disable_colors() {
    console::set_colors_enabled(false);
    console::set_colors_enabled_stderr(false);
}
