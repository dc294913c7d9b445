use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Reachability state of a monitored target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetStatus::Up => write!(f, "up"),
            TargetStatus::Down => write!(f, "down"),
            TargetStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of a single reachability probe. Produced and consumed within one
/// monitoring pass, never retained across ticks.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// URL that was probed
    pub target: String,

    /// Whether the target answered within the timeout
    pub reachable: bool,

    /// Timestamp when the probe completed or was abandoned
    pub observed_at: SystemTime,
}

/// Per-target bookkeeping carried between monitoring passes
#[derive(Debug, Clone, Default)]
pub struct TargetState {
    pub status: TargetStatus,

    /// Successful ticks since the last failure or heartbeat
    pub consecutive_successes: u32,

    /// Ticks spent in the current down streak, drives the re-alert cadence
    pub ticks_down: u32,
}
