//! Core functionality for the ECG monitor.
//!
//! This module contains:
//! - The reading and condition data model
//! - The stateful detector that classifies each reading

pub mod detector;
pub mod model;

// Re-export commonly used types
pub use detector::Detector;
pub use model::{
    Condition, ConditionKind, Reading, ReadingError, Severity, BRADYCARDIA_THRESHOLD,
    RR_VARIATION_ARRHYTHMIA_THRESHOLD, TACHYCARDIA_THRESHOLD,
};
