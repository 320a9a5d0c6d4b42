//! ECG Monitor - streaming cardiac telemetry analysis with alerts.
//!
//! This library classifies a stream of per-heartbeat readings and raises
//! alerts for tachycardia, bradycardia, and irregular rhythm. It ships a
//! simulator that streams synthetic readings over WebSocket and a client that
//! consumes them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐            ┌──────────────────────────────────────┐
//! │      Simulator       │            │            Monitor client            │
//! ├──────────────────────┤  WebSocket ├──────────────────────────────────────┤
//! │ ┌──────────────────┐ │   (JSON)   │ ┌──────────┐   ┌──────────────────┐  │
//! │ │ ReadingGenerator │─┼───────────▶│ │ Detector │──▶│   AlertFanout    │  │
//! │ └──────────────────┘ │            │ └──────────┘   │ log │ beep │ ... │  │
//! └──────────────────────┘            │                └──────────────────┘  │
//!                                     └──────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use ecg_monitor::core::{ConditionKind, Detector, Reading};
//!
//! let mut detector = Detector::new();
//! let reading = Reading {
//!     timestamp: chrono::Utc::now(),
//!     heart_rate: 130,
//!     rr_interval: 60.0 / 130.0,
//!     qt_interval: 0.35,
//!     pr_interval: 0.15,
//!     qrs_interval: 0.08,
//!     signal_quality: 0.95,
//! };
//!
//! let condition = detector.classify(&reading).expect("tachycardia");
//! assert_eq!(condition.kind, ConditionKind::Tachycardia);
//! ```

pub mod alert;
pub mod client;
pub mod config;
pub mod core;
pub mod server;
pub mod source;
pub mod stats;

// Re-export key types at crate root for convenience
pub use alert::{AlertFanout, AlertSink, AudibleAlerts, Beeper, ProgressIndicator, SessionLogger};
pub use client::{ClientError, MonitorSession, SessionEnd};
pub use config::{Config, MonitorConfig, SimulatorConfig};
pub use core::{Condition, ConditionKind, Detector, Reading, ReadingError, Severity};
pub use source::ReadingGenerator;
pub use stats::{SessionStats, SharedSessionStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown when monitoring starts.
pub const MONITORING_DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                 ECG MONITOR - NOT A MEDICAL DEVICE               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Alerts are raised from fixed thresholds on derived features:    ║
║    • Tachycardia: heart rate above 100 BPM                       ║
║    • Bradycardia: heart rate below 60 BPM                        ║
║    • Arrhythmia:  RR interval change above 15% beat-to-beat      ║
║                                                                  ║
║  Only one alert is raised per reading. Irregular rhythm takes    ║
║  precedence over a rate alert on the same beat.                  ║
║                                                                  ║
║  Results are for demonstration only and carry no diagnostic      ║
║  accuracy.                                                       ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
