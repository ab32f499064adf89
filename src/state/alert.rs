//! Completion alert structure

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an unanswered alert stays visible
pub const ALERT_TIMEOUT_SECS: u64 = 30;

/// Visual alert raised when a session reaches zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionAlert {
    pub id: u64,
    pub title: String,
    pub body: String,
    /// Label of the single action, which starts another session
    pub action_label: String,
    pub raised_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CompletionAlert {
    pub fn new(id: u64, configured_minutes: u64) -> Self {
        let raised_at = Utc::now();
        Self {
            id,
            title: "🍅 Pomodoro Complete!".to_string(),
            body: format!(
                "Congratulations! You completed a {}-minute focus session. Time for a well-deserved break!",
                configured_minutes
            ),
            action_label: "Start Another Session".to_string(),
            raised_at,
            expires_at: raised_at + Duration::seconds(ALERT_TIMEOUT_SECS as i64),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_names_configured_minutes() {
        let alert = CompletionAlert::new(3, 45);
        assert!(alert.body.contains("45-minute"));
        assert_eq!(alert.action_label, "Start Another Session");
        assert_eq!(alert.id, 3);
    }

    #[test]
    fn expires_thirty_seconds_after_raise() {
        let alert = CompletionAlert::new(1, 25);
        assert_eq!((alert.expires_at - alert.raised_at).num_seconds(), 30);
        assert!(!alert.is_expired(alert.raised_at));
        assert!(alert.is_expired(alert.raised_at + Duration::seconds(30)));
    }
}
