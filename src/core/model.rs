//! Cardiac telemetry data model.
//!
//! A [`Reading`] carries the features already extracted for one heartbeat; the
//! monitor never sees raw ECG voltage samples. A [`Condition`] is what the
//! detector emits when a reading looks dangerous.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heart rate above which a reading is tachycardic (BPM).
pub const TACHYCARDIA_THRESHOLD: i32 = 100;

/// Heart rate below which a reading is bradycardic (BPM).
pub const BRADYCARDIA_THRESHOLD: i32 = 60;

/// Relative beat-to-beat RR interval change above which the rhythm is irregular.
pub const RR_VARIATION_ARRHYTHMIA_THRESHOLD: f64 = 0.15;

/// Derived features of a single heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// When the reading was produced
    pub timestamp: DateTime<Utc>,
    /// Beats per minute
    pub heart_rate: i32,
    /// Seconds since the previous beat
    pub rr_interval: f64,
    /// QT interval in seconds
    pub qt_interval: f64,
    /// PR interval in seconds
    pub pr_interval: f64,
    /// QRS duration in seconds
    pub qrs_interval: f64,
    /// Unitless quality in [0, 1]
    pub signal_quality: f64,
}

impl Reading {
    /// Parse one transport message into a validated reading.
    pub fn parse(message: &str) -> Result<Self, ReadingError> {
        let reading: Reading =
            serde_json::from_str(message).map_err(|e| ReadingError::Malformed(e.to_string()))?;
        reading.validate()?;
        Ok(reading)
    }

    /// Check the reading is usable by the detector.
    ///
    /// Only the RR interval is checked: the arrhythmia rule divides by it on the
    /// next beat. Implausible heart rates are still classified.
    pub fn validate(&self) -> Result<(), ReadingError> {
        if !self.rr_interval.is_finite() || self.rr_interval <= 0.0 {
            return Err(ReadingError::InvalidRrInterval(self.rr_interval));
        }
        Ok(())
    }
}

/// Kind of cardiac anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Tachycardia,
    Bradycardia,
    Arrhythmia,
}

impl ConditionKind {
    /// Lowercase name used in logs and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Tachycardia => "tachycardia",
            ConditionKind::Bradycardia => "bradycardia",
            ConditionKind::Arrhythmia => "arrhythmia",
        }
    }

    /// Fixed human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            ConditionKind::Tachycardia => "Abnormally high heart rate detected",
            ConditionKind::Bradycardia => "Abnormally low heart rate detected",
            ConditionKind::Arrhythmia => "Irregular heart rhythm detected",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity tier, ordered by increasing risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub severity: Severity,
    /// Heart rate of the triggering reading
    pub heart_rate: i32,
    /// Timestamp of the triggering reading
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl Condition {
    /// Build a condition for `reading` with the kind's fixed description.
    pub fn new(kind: ConditionKind, severity: Severity, reading: &Reading) -> Self {
        Self {
            kind,
            severity,
            heart_rate: reading.heart_rate,
            timestamp: reading.timestamp,
            description: kind.description().to_string(),
        }
    }
}

/// Errors for messages that cannot become a [`Reading`].
#[derive(Debug)]
pub enum ReadingError {
    Malformed(String),
    InvalidRrInterval(f64),
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingError::Malformed(e) => write!(f, "Malformed reading: {e}"),
            ReadingError::InvalidRrInterval(rr) => {
                write!(f, "Invalid RR interval: {rr} (must be a positive number of seconds)")
            }
        }
    }
}

impl std::error::Error for ReadingError {}
