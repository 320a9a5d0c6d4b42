//! Alert delivery for the ECG monitor.
//!
//! Every classified reading ends up at an [`AlertSink`]: conditions on the
//! alert path, everything else on the normal path. Concrete sinks (log file,
//! terminal bell, progress legend, statistics) are composed once at startup
//! with [`AlertFanout`].

pub mod beeper;
pub mod console;
pub mod logger;

use crate::core::model::{Condition, Reading};
use std::sync::Arc;

pub use beeper::{beep_pattern, AudibleAlerts, BeepError, Beeper};
pub use console::ProgressIndicator;
pub use logger::SessionLogger;

/// Receiver of classification results.
///
/// Calls are notifications: a sink handles its own failures and never
/// reports them back to the caller.
pub trait AlertSink: Send + Sync {
    /// Record a detected anomaly.
    fn record_condition(&self, condition: &Condition);

    /// Record a reading that raised no condition.
    fn record_normal(&self, reading: &Reading);
}

impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    fn record_condition(&self, condition: &Condition) {
        (**self).record_condition(condition);
    }

    fn record_normal(&self, reading: &Reading) {
        (**self).record_normal(reading);
    }
}

impl<T: AlertSink + ?Sized> AlertSink for Box<T> {
    fn record_condition(&self, condition: &Condition) {
        (**self).record_condition(condition);
    }

    fn record_normal(&self, reading: &Reading) {
        (**self).record_normal(reading);
    }
}

/// Dispatches to several sinks in insertion order.
#[derive(Default)]
pub struct AlertFanout {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl AlertFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink, builder style.
    pub fn with(mut self, sink: impl AlertSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Add a sink.
    pub fn push(&mut self, sink: impl AlertSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AlertSink for AlertFanout {
    fn record_condition(&self, condition: &Condition) {
        for sink in &self.sinks {
            sink.record_condition(condition);
        }
    }

    fn record_normal(&self, reading: &Reading) {
        for sink in &self.sinks {
            sink.record_normal(reading);
        }
    }
}
