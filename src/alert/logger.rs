//! Per-session alert log.
//!
//! One append-only file per monitoring session, one line per reading. Alert
//! lines are mirrored to stdout; normal lines go to the file only.

use crate::alert::AlertSink;
use crate::core::model::{Condition, Reading};
use chrono::{DateTime, Local, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Writes ALERT and NORMAL lines for one session.
pub struct SessionLogger {
    file: Mutex<LineWriter<File>>,
    path: PathBuf,
    log_normal: bool,
    mirror_to_console: bool,
}

impl SessionLogger {
    /// Create `ecg_log_<timestamp>.log` inside `log_dir`, creating the directory if needed.
    pub fn create(log_dir: &Path, log_normal: bool) -> io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;

        let path = log_dir.join(format!(
            "ecg_log_{}.log",
            Local::now().format("%Y-%m-%d_%H-%M-%S")
        ));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::debug!("Session log opened at {:?}", path);

        Ok(Self {
            file: Mutex::new(LineWriter::new(file)),
            path,
            log_normal,
            mirror_to_console: true,
        })
    }

    /// Disable mirroring of alert lines to stdout.
    pub fn without_console(mut self) -> Self {
        self.mirror_to_console = false;
        self
    }

    /// Path of the session log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, message: &str, console: bool) {
        let line = format!("{} {}", Local::now().format("%Y/%m/%d %H:%M:%S"), message);

        {
            let mut file = match self.file.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(e) = writeln!(file, "{line}") {
                tracing::warn!("Failed to write session log {:?}: {}", self.path, e);
            }
        }

        // Printed after the lock is released so stdout never stalls file writes.
        if console {
            println!("{line}");
        }
    }
}

/// Format the ALERT line body for a condition.
pub fn format_condition(condition: &Condition) -> String {
    format!(
        "ALERT: {} detected - Severity: {}, Heart rate: {} BPM at {} - {}",
        condition.kind,
        condition.severity,
        condition.heart_rate,
        clock_time(condition.timestamp),
        condition.description
    )
}

/// Format the NORMAL line body for a reading.
pub fn format_normal(reading: &Reading) -> String {
    format!(
        "NORMAL: Heart rate: {} BPM, RR Interval: {:.2}s at {}",
        reading.heart_rate,
        reading.rr_interval,
        clock_time(reading.timestamp)
    )
}

fn clock_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

impl AlertSink for SessionLogger {
    fn record_condition(&self, condition: &Condition) {
        self.write_line(&format_condition(condition), self.mirror_to_console);
    }

    fn record_normal(&self, reading: &Reading) {
        if self.log_normal {
            self.write_line(&format_normal(reading), false);
        }
    }
}
