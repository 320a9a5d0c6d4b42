//! Per-session monitoring statistics.
//!
//! Counters are atomics so the consumer loop and the sinks can update them
//! without sharing a lock.

use crate::alert::AlertSink;
use crate::core::model::{Condition, ConditionKind, Reading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// File name of the persisted summary inside the log directory.
pub const LAST_SESSION_FILE: &str = "last_session.json";

/// Statistics for the current monitoring session.
#[derive(Debug)]
pub struct SessionStats {
    /// Identifier of this session
    session_id: Uuid,
    /// Messages delivered by the transport
    messages_received: AtomicU64,
    /// Messages that could not be turned into a reading
    malformed_messages: AtomicU64,
    /// Readings that raised no condition
    normal_readings: AtomicU64,
    tachycardia: AtomicU64,
    bradycardia: AtomicU64,
    arrhythmia: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting the summary
    persist_path: Option<PathBuf>,
}

impl SessionStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            messages_received: AtomicU64::new(0),
            malformed_messages: AtomicU64::new(0),
            normal_readings: AtomicU64::new(0),
            tachycardia: AtomicU64::new(0),
            bradycardia: AtomicU64::new(0),
            arrhythmia: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create statistics that [`save`](Self::save) into `log_dir`.
    pub fn with_persistence(log_dir: &Path) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(log_dir.join(LAST_SESSION_FILE));
        stats
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Record a message from the transport.
    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message that was skipped as malformed.
    pub fn record_malformed(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    fn kind_counter(&self, kind: ConditionKind) -> &AtomicU64 {
        match kind {
            ConditionKind::Tachycardia => &self.tachycardia,
            ConditionKind::Bradycardia => &self.bradycardia,
            ConditionKind::Arrhythmia => &self.arrhythmia,
        }
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        let tachycardia = self.tachycardia.load(Ordering::Relaxed);
        let bradycardia = self.bradycardia.load(Ordering::Relaxed);
        let arrhythmia = self.arrhythmia.load(Ordering::Relaxed);

        StatsSnapshot {
            session_id: self.session_id,
            messages_received: self.messages_received.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
            normal_readings: self.normal_readings.load(Ordering::Relaxed),
            conditions: tachycardia + bradycardia + arrhythmia,
            tachycardia,
            bradycardia,
            arrhythmia,
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        self.snapshot().summary()
    }

    /// Save the summary to disk, if persistence is configured.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let json =
                serde_json::to_string_pretty(&self.snapshot()).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for SessionStats {
    fn record_condition(&self, condition: &Condition) {
        self.kind_counter(condition.kind)
            .fetch_add(1, Ordering::Relaxed);
    }

    fn record_normal(&self, _reading: &Reading) {
        self.normal_readings.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the session statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub session_id: Uuid,
    pub messages_received: u64,
    pub malformed_messages: u64,
    pub normal_readings: u64,
    pub conditions: u64,
    pub tachycardia: u64,
    pub bradycardia: u64,
    pub arrhythmia: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl StatsSnapshot {
    /// Load the summary saved by the last session in `log_dir`.
    pub fn load_last(log_dir: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(log_dir.join(LAST_SESSION_FILE))?;
        serde_json::from_str(&content).map_err(std::io::Error::other)
    }

    pub fn summary(&self) -> String {
        format!(
            "Session Statistics:\n\
             - Session: {}\n\
             - Messages received: {}\n\
             - Malformed messages skipped: {}\n\
             - Normal readings: {}\n\
             - Conditions detected: {}\n\
             \x20 - Tachycardia: {}\n\
             \x20 - Bradycardia: {}\n\
             \x20 - Arrhythmia: {}\n\
             - Session duration: {} seconds",
            self.session_id,
            self.messages_received,
            self.malformed_messages,
            self.normal_readings,
            self.conditions,
            self.tachycardia,
            self.bradycardia,
            self.arrhythmia,
            self.session_duration_secs
        )
    }
}

/// Thread-safe shared session statistics.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create new shared statistics.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

/// Create new shared statistics persisted into `log_dir`.
pub fn create_shared_stats_with_persistence(log_dir: &Path) -> SharedSessionStats {
    Arc::new(SessionStats::with_persistence(log_dir))
}
