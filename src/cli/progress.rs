//! Terminal progress and summary output.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::batch::{BatchResult, ProgressEvent, ProgressStatus};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

/// Shorten a reference for the bar message.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}

/// One line per finished input, as printed with `--progress`.
pub fn event_line(event: &ProgressEvent) -> Option<String> {
    let prefix = format!("[{}/{}]", event.current, event.total);
    match event.status {
        ProgressStatus::Processing => None,
        ProgressStatus::Completed => Some(format!(
            "{} {} {} - {}",
            prefix,
            style("✓").green(),
            event.reference,
            event.status
        )),
        ProgressStatus::Failed => Some(format!(
            "{} {} {} - {}",
            prefix,
            style("✗").red(),
            event.reference,
            event.error.as_deref().unwrap_or("failed")
        )),
    }
}

/// Drives a progress bar from batch events.
pub struct BatchProgress {
    bar: ProgressBar,
    print_lines: bool,
}

impl BatchProgress {
    pub fn new(total: usize, print_lines: bool) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar, print_lines }
    }

    fn handle(&self, event: &ProgressEvent) {
        match event.status {
            ProgressStatus::Processing => self.bar.set_message(truncate(&event.reference, 40)),
            ProgressStatus::Completed | ProgressStatus::Failed => {
                self.bar.inc(1);
                if self.print_lines {
                    if let Some(line) = event_line(event) {
                        self.bar.println(line);
                    }
                }
            }
        }
    }

    /// Consume events until every sender is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<ProgressEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(&event);
        }
        self.bar.finish_and_clear();
    }
}

/// Wait for the display task; a failure there never fails the batch.
pub async fn finish(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Progress display stopped early: {}", e);
            false
        }
    }
}

pub fn print_summary(batch: &BatchResult) {
    let stats = batch.stats();

    println!("\n{}", style("Processing Summary").bold());
    println!("{}", "-".repeat(50));
    println!("  {:<18} {}", "Total files:", stats.total);
    println!(
        "  {:<18} {}",
        "Processed:",
        style(stats.processed).green()
    );
    println!("  {:<18} {}", "Failed:", style(stats.failed).red());
    println!("  {:<18} {}", "Skipped:", style(stats.skipped).yellow());
    println!(
        "  {:<18} {:.2}s",
        "Total time:",
        batch.duration.as_secs_f64()
    );
    println!(
        "  {:<18} {:.2} files/sec",
        "Processing rate:", stats.processing_rate
    );
    println!("  {:<18} {:.1}%", "Error rate:", stats.error_rate);
    println!(
        "  {:<18} {:.2} MB",
        "Data processed:",
        stats.total_size as f64 / (1024.0 * 1024.0)
    );

    let failures: Vec<_> = batch.results.iter().filter(|r| r.is_failed()).collect();
    if !failures.is_empty() {
        println!("\n{}", style("Failures:").red());
        for result in failures {
            println!(
                "  {} {}",
                style(&result.source_ref).dim(),
                result.error.as_deref().unwrap_or_default()
            );
        }
    }
}
