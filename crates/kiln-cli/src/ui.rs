//! Terminal output for the CLI.
//!
//! Results go to stdout so they can be captured by build scripts; progress,
//! warnings and errors go to stderr.

use std::io::{IsTerminal, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use kiln_core::Reporter;
use kiln_schema::Diagnostic;

/// [`Reporter`] writing styled lines to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    quiet: bool,
    live: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            live: std::io::stderr().is_terminal(),
        }
    }

    /// Print flag selection diagnostics as warnings.
    pub fn diagnostics(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            self.warning(&diagnostic.to_string());
        }
    }

    fn clear_line(&self) {
        if self.live {
            crossterm::execute!(
                std::io::stderr(),
                MoveToColumn(0),
                Clear(ClearType::CurrentLine)
            )
            .ok();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if !self.quiet {
            eprintln!();
            eprintln!("{}", title.white().bold());
        }
    }

    fn downloading(&self, name: &str, current: u64, total: Option<u64>) {
        // Redrawing only makes sense on a terminal.
        if self.quiet || !self.live {
            return;
        }
        let progress = match total.filter(|&t| t > 0) {
            Some(total) => format!("{} / {}", format_size(current), format_size(total)),
            None => format_size(current),
        };
        eprint!("\r  {name:<12}{}", progress.dark_grey());
        std::io::stderr().flush().ok();
    }

    fn extracting(&self, name: &str, files: usize) {
        if !self.quiet {
            self.clear_line();
            eprintln!("  {name:<12}{}", format!("unpacking {files} files").dark_grey());
        }
    }

    fn done(&self, name: &str, detail: &str) {
        if !self.quiet {
            self.clear_line();
            eprintln!("  {name:<12}{} {}", "ok".green(), detail.dark_grey());
        }
    }

    fn failed(&self, name: &str, reason: &str) {
        self.clear_line();
        eprintln!("  {name:<12}{} {reason}", "failed".red());
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{msg}");
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!("{} {msg}", "warning:".yellow().bold());
    }
}

/// Format a byte count for progress output.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    // One decimal place without going through floats.
    let tenths = |unit: u64| {
        let t = bytes.saturating_mul(10) / unit;
        format!("{}.{}", t / 10, t % 10)
    };

    if bytes >= MB {
        format!("{} MB", tenths(MB))
    } else if bytes >= KB {
        format!("{} KB", tenths(KB))
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn test_format_size_larger_units() {
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
