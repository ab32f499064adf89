//! Timer snapshot structure shared with clients

use serde::{Deserialize, Serialize};

/// Observable phase of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    /// Only observable for the instant a session hits zero
    Completed,
}

/// Read-only copy of the timer handed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub remaining_seconds: u64,
    pub configured_seconds: u64,
    pub running: bool,
}

impl TimerSnapshot {
    /// Phase as a client would infer it from the snapshot alone
    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else if self.remaining_seconds == 0 {
            TimerPhase::Completed
        } else if self.remaining_seconds < self.configured_seconds {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        }
    }

    /// Remaining time rendered as `MM:SS`
    pub fn display(&self) -> String {
        format_mmss(self.remaining_seconds)
    }
}

/// Format seconds as zero-padded `MM:SS`. Minutes are not wrapped into hours.
pub fn format_mmss(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
