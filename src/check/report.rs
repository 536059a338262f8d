//! Report sink for user-facing status lines.
//!
//! The status lines a check emits are its observable output contract (the
//! thing operators and deploy logs see), so they are routed through a trait
//! rather than printed directly. Tests capture them with [`MemoryReport`]
//! and assert the exact text.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Trait for receiving status lines from a check.
pub trait Report: Send + Debug {
    /// Emit one status line.
    fn line(&mut self, message: &str);
}

/// Prints status lines to stdout. The CLI's default sink.
#[derive(Debug, Default)]
pub struct StdoutReport;

impl Report for StdoutReport {
    fn line(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Collects status lines in memory.
///
/// Cloning shares the underlying buffer, so a test can keep one handle and
/// give the other to a check:
///
/// ```
/// use drainwatch::{MemoryReport, Report};
///
/// let report = MemoryReport::new();
/// let mut sink = report.clone();
/// sink.line("1 of 1 web01 servers are enabled");
/// assert_eq!(report.lines().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryReport {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryReport {
    /// Create an empty report buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines reported so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// The most recent line, if any.
    pub fn last(&self) -> Option<String> {
        self.lines.lock().unwrap().last().cloned()
    }
}

impl Report for MemoryReport {
    fn line(&mut self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_report_shares_buffer_across_clones() {
        let report = MemoryReport::new();
        let mut sink = report.clone();

        sink.line("first");
        sink.line("second");

        assert_eq!(report.lines(), vec!["first", "second"]);
        assert_eq!(report.last().as_deref(), Some("second"));
    }
}
