//! Session statistics for the ECG monitor.
//!
//! Tracks what a monitoring session received and raised, for the shutdown
//! summary and the `status` command.

pub mod session;

// Re-export commonly used types
pub use session::{
    create_shared_stats, create_shared_stats_with_persistence, SessionStats, SharedSessionStats,
    StatsSnapshot, LAST_SESSION_FILE,
};
