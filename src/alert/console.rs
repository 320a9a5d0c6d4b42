//! Live progress legend for interactive sessions.
//!
//! `!` marks every condition, `.` every fifth message, and a fresh
//! `Monitoring: ` prefix starts every fifty messages.

use crate::alert::AlertSink;
use crate::core::model::{Condition, Reading};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Normal messages per printed dot.
const DOT_EVERY: u64 = 5;

/// Messages per console line.
const LINE_EVERY: u64 = 50;

/// Prints the `.`/`!` legend to stdout.
#[derive(Debug, Default)]
pub struct ProgressIndicator {
    messages: AtomicU64,
}

impl ProgressIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header printed once before the first message.
    pub fn banner() -> &'static str {
        "\n=== ECG Monitoring Started ===\nLegend: . = normal reading, ! = irregularity detected\nMonitoring: "
    }

    /// Advance the message counter and return what to print for it.
    fn advance(&self, anomalous: bool) -> String {
        let count = self.messages.fetch_add(1, Ordering::Relaxed) + 1;

        let mut out = String::new();
        if anomalous {
            out.push('!');
        } else if count % DOT_EVERY == 0 {
            out.push('.');
        }
        if count % LINE_EVERY == 0 {
            out.push_str("\nMonitoring: ");
        }
        out
    }

    fn emit(&self, anomalous: bool) {
        let out = self.advance(anomalous);
        if out.is_empty() {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(out.as_bytes());
        let _ = stdout.flush();
    }
}

impl AlertSink for ProgressIndicator {
    fn record_condition(&self, _condition: &Condition) {
        self.emit(true);
    }

    fn record_normal(&self, _reading: &Reading) {
        self.emit(false);
    }
}
