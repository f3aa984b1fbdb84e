//! Poller status
//!
//! Last-value counters for logs. Nothing here outlives the process.

use chrono::{DateTime, Utc};

/// Where the loop is right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    /// Sleeping between cycles
    #[default]
    Idle,
    /// Running fetch → predict → publish
    Active,
}

#[derive(Debug, Clone, Default)]
pub struct PollerStatus {
    pub state: PollerState,
    pub cycles: u64,
    pub predictions: u64,
    pub no_data_cycles: u64,
    pub failed_cycles: u64,
    /// Remote-call failures in a row; drives backoff
    pub consecutive_remote_failures: u32,
    /// Sensor fields substituted with 0.0, all time
    pub defaulted_fields: u64,
    pub last_label: Option<String>,
    pub last_error: Option<String>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl PollerStatus {
    /// One-line summary for debug logging
    pub fn summary(&self) -> String {
        format!(
            "cycles={} predictions={} no_data={} failed={} streak={} last={}",
            self.cycles,
            self.predictions,
            self.no_data_cycles,
            self.failed_cycles,
            self.consecutive_remote_failures,
            self.last_label.as_deref().unwrap_or("-"),
        )
    }
}
