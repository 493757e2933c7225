//! Progress reporting for lookups
//!
//! Provides a live spinner while a run is in flight and the header/summary
//! printed around it.

use crate::error::RequesterOutcome;
use crate::lookup::{LookupProgress, LookupResult};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Progress reporter that displays lookup status
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        let spinner = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(spinner);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &LookupProgress) {
        self.bar.set_message(progress_message(progress));
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn progress_message(progress: &LookupProgress) -> String {
    format!(
        "Read: {} | Resolved: {} | Failed: {} | Rate: {:.0}/s | Queue: {}/{} | Readers: {}",
        format_number(progress.hostnames_read),
        format_number(progress.resolved),
        format_number(progress.failed),
        progress.lookups_per_second(),
        progress.queue_len,
        progress.queue_capacity,
        progress.active_requesters,
    )
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the lookup results
pub fn print_summary(result: &LookupResult, output: &Path) {
    let title = if result.completed {
        style("Lookup Complete").green().bold()
    } else {
        style("Lookup Interrupted").yellow().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {} of {}",
        style("Inputs read:").bold(),
        result.inputs_read(),
        result.requesters
    );
    println!(
        "  {} {}",
        style("Hostnames:").bold(),
        format_number(result.hostnames_read)
    );
    println!(
        "  {} {}",
        style("Resolved:").bold(),
        format_number(result.resolved)
    );
    if result.failed > 0 {
        println!(
            "  {} {}",
            style("Unresolved:").yellow().bold(),
            format_number(result.failed)
        );
    }
    if result.truncated > 0 {
        println!(
            "  {} {}",
            style("Truncated:").yellow().bold(),
            format_number(result.truncated)
        );
    }
    println!(
        "  {} {:.1}s ({:.0} lookups/sec)",
        style("Duration:").bold(),
        result.duration.as_secs_f64(),
        result.lookups_per_second()
    );
    println!(
        "  {} {} / {}",
        style("Queue peak:").bold(),
        result.high_water,
        result.queue_capacity
    );

    let failed_inputs: Vec<&RequesterOutcome> =
        result.outcomes.iter().filter(|o| !o.is_success()).collect();
    if !failed_inputs.is_empty() {
        println!("  {}", style("Incomplete inputs:").red().bold());
        for outcome in failed_inputs {
            println!(
                "    {} ({} queued)",
                outcome.path().display(),
                format_number(outcome.queued())
            );
        }
    }

    if result.write_errors > 0 {
        println!(
            "  {} {}",
            style("Write errors:").red().bold(),
            format_number(result.write_errors)
        );
    }
    println!("  {} {}", style("Output:").bold(), output.display());
    println!();
}

/// Print a header at the start of the run
pub fn print_header(inputs: usize, resolvers: usize, queue_size: usize, output: &Path) {
    println!();
    println!(
        "{} {}",
        style("multi-lookup").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Inputs:").bold(), inputs);
    println!("  {} {}", style("Resolvers:").bold(), resolvers);
    println!("  {} {}", style("Queue size:").bold(), queue_size);
    println!("  {} {}", style("Output:").bold(), output.display());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_progress_message() {
        let progress = LookupProgress {
            hostnames_read: 12_000,
            resolved: 9_000,
            failed: 1_000,
            queue_len: 3,
            queue_capacity: 10,
            active_requesters: 2,
            total_resolvers: 8,
            elapsed: Duration::from_secs(5),
        };

        let msg = progress_message(&progress);
        assert!(msg.contains("Read: 12,000"));
        assert!(msg.contains("Failed: 1,000"));
        assert!(msg.contains("Rate: 2000/s"));
        assert!(msg.contains("Queue: 3/10"));
    }
}
