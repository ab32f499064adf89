//! Popup rendering of a timer snapshot

use std::fmt;

use crate::state::{format_mmss, TimerSnapshot};

/// Everything the popup shows for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub display: String,
    pub status: &'static str,
    pub start_enabled: bool,
    pub pause_enabled: bool,
}

impl PopupView {
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        let status = if snapshot.running {
            "Running"
        } else if snapshot.remaining_seconds == 0 {
            "Completed!"
        } else if snapshot.remaining_seconds < snapshot.configured_seconds {
            "Paused"
        } else {
            "Ready"
        };

        Self {
            display: format_mmss(snapshot.remaining_seconds),
            status,
            start_enabled: !snapshot.running,
            pause_enabled: snapshot.running,
        }
    }
}

impl fmt::Display for PopupView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let button = |label: &str, enabled: bool| {
            if enabled {
                format!("[{}]", label)
            } else {
                format!(" {} ", label.to_lowercase())
            }
        };
        write!(
            f,
            "{}  {:<10} {} {} [Reset]",
            self.display,
            self.status,
            button("Start", self.start_enabled),
            button("Pause", self.pause_enabled),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(remaining: u64, configured: u64, running: bool) -> TimerSnapshot {
        TimerSnapshot {
            remaining_seconds: remaining,
            configured_seconds: configured,
            running,
        }
    }

    #[test]
    fn buttons_mirror_running_flag() {
        let running = PopupView::from_snapshot(&snapshot(125, 1500, true));
        assert_eq!(running.display, "02:05");
        assert_eq!(running.status, "Running");
        assert!(!running.start_enabled);
        assert!(running.pause_enabled);

        let idle = PopupView::from_snapshot(&snapshot(1500, 1500, false));
        assert_eq!(idle.status, "Ready");
        assert!(idle.start_enabled);
        assert!(!idle.pause_enabled);
    }

    #[test]
    fn status_labels() {
        assert_eq!(PopupView::from_snapshot(&snapshot(600, 1500, false)).status, "Paused");
        assert_eq!(PopupView::from_snapshot(&snapshot(0, 1500, false)).status, "Completed!");
        assert_eq!(PopupView::from_snapshot(&snapshot(0, 1500, false)).display, "00:00");
    }

    #[test]
    fn renders_a_single_line() {
        let line = PopupView::from_snapshot(&snapshot(90, 1500, true)).to_string();
        assert_eq!(line, "01:30  Running     start  [Pause] [Reset]");
    }
}
