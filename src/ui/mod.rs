//! CLI UI utilities: status lines, spinner and text truncation.
//!
//! Everything here writes to stderr so stdout stays clean for results.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::pipeline::SkippedRecord;

/// Check if stderr is a terminal.
pub fn stderr_is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Check if stdout is a terminal.
pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Print a styled status line to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    if !stderr_is_terminal() {
        eprintln!("{} {}", icon, msg);
        return;
    }

    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Search => eprintln!("{} {}", icon.yellow(), msg),
    }
}

/// Print the identifiers that produced no row.
pub fn print_skipped(skipped: &[SkippedRecord]) {
    if skipped.is_empty() {
        return;
    }

    print_status(
        Status::Warning,
        &format!("Skipped {} record(s):", skipped.len()),
    );
    for record in skipped {
        eprintln!("    {}: {}", record.pubmed_id, record.reason);
    }
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    // Use unicode-width to properly handle wide characters
    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();

    if total_width <= max_width {
        return text.to_string();
    }

    // Find the longest prefix that fits
    let mut current_width = 0;
    let mut end_idx = 0;

    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Spinner shown on stderr while records are processed.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) =
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
        {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing (quiet mode, debug mode, or no terminal).
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    /// Show per-record progress.
    pub fn record(&self, position: usize, total: usize, pubmed_id: &str) {
        self.pb
            .set_message(format!("Fetching record {}/{} (PMID {})", position, total, pubmed_id));
    }

    /// Stop and erase the spinner.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
