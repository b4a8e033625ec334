use std::path::Path;
use std::time::Duration;

use owo_colors::OwoColorize;
use webharvest_core::{ExtractionResult, HarvestError, Reporter};

use crate::VERSION;

/// Print a styled banner
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Webharvest".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Archive web articles as Markdown\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the end-of-run summary
pub fn print_summary(result: &ExtractionResult, elapsed: Duration) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Extraction complete".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!(
        "  {} {}",
        "Succeeded:".dimmed(),
        result.success_count.to_string().bright_green()
    );
    if result.has_failures() {
        eprintln!("  {} {}", "Failed:".dimmed(), result.fail_count.to_string().bright_red());
        for failed in &result.failed_urls {
            let url = if failed.url.is_empty() { "(no URL)" } else { failed.url.as_str() };
            eprintln!("    {} {} {}", "-".dimmed(), failed.title, url.dimmed());
        }
    } else {
        eprintln!("  {} {}", "Failed:".dimmed(), "0".bright_white());
    }
    eprintln!(
        "  {} {:.1}s\n",
        "Elapsed:".dimmed(),
        elapsed.as_secs_f64()
    );
}

/// Colored progress output on stderr.
///
/// Quiet mode drops everything except article failures.
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn run_started(&self, total: usize) {
        if !self.quiet {
            print_info(&format!("Extracting {} articles", total));
        }
    }

    fn article_started(&self, index: usize, total: usize, title: &str) {
        if !self.quiet {
            print_step(index, total, title);
        }
    }

    fn article_saved(&self, _title: &str, path: &Path) {
        if !self.quiet {
            print_success(&format!("Saved {}", path.display().bright_white()));
        }
    }

    fn article_failed(&self, title: &str, error: &HarvestError) {
        print_error(&format!("{}: {}", title, error));
    }

    fn images_found(&self, _title: &str, count: usize) {
        if !self.quiet {
            eprintln!("  {} {}", "Images:".dimmed(), count.to_string().bright_white());
        }
    }

    fn image_saved(&self, url: &str, path: &Path) {
        if !self.quiet {
            eprintln!("    {} {} {}", "↓".dimmed(), url.dimmed(), path.display());
        }
    }

    fn image_failed(&self, url: &str, error: &HarvestError) {
        if !self.quiet {
            print_warning(&format!("Image {} failed: {}", url, error));
        }
    }

    fn file_written(&self, path: &Path) {
        if !self.quiet {
            print_info(&format!("Wrote {}", path.display()));
        }
    }
}
