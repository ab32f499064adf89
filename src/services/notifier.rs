//! Desktop notification mirror for completion alerts
//!
//! The authoritative alert is the record held by the daemon and pushed to
//! clients. The desktop popup is a best-effort copy carrying the same
//! "Start Another Session" action: when it is disabled or the notification
//! server refuses it, the timer carries on regardless.

use notify_rust::{Notification, Timeout};
use thiserror::Error;
use tracing::debug;

use crate::state::alert::{CompletionAlert, ALERT_TIMEOUT_SECS};

/// Identifier of the single action offered on a completion alert
pub const START_ANOTHER_ACTION: &str = "start-another";

/// Invoked at most once, when the user picks the alert's action
pub type OnAlertAction = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Desktop notifications are disabled")]
    Disabled,

    #[error("Notification server rejected the alert: {0}")]
    Rejected(String),
}

/// Something that can surface a completion alert outside the daemon
pub trait Notifier: Send + Sync {
    /// Show the alert. `on_action` runs if the user picks its action.
    fn show(&self, alert: &CompletionAlert, on_action: OnAlertAction) -> Result<(), NotifyError>;

    /// Take down the alert with this id, if it is still shown
    fn close(&self, alert_id: u64);
}

/// Shows alerts through the platform notification server
pub struct DesktopNotifier {
    app_name: String,
    #[cfg(all(unix, not(target_os = "macos")))]
    shown: std::sync::Mutex<std::collections::HashMap<u64, notify_rust::NotificationHandle>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            app_name: "pomodoro-keeper".to_string(),
            #[cfg(all(unix, not(target_os = "macos")))]
            shown: Default::default(),
        }
    }

    fn notification(&self, alert: &CompletionAlert) -> Notification {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(&alert.title)
            .body(&alert.body)
            .action(START_ANOTHER_ACTION, &alert.action_label)
            .timeout(Timeout::Milliseconds((ALERT_TIMEOUT_SECS * 1000) as u32));
        notification
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
impl Notifier for DesktopNotifier {
    fn show(&self, alert: &CompletionAlert, on_action: OnAlertAction) -> Result<(), NotifyError> {
        debug!("Showing desktop notification for alert {}", alert.id);

        let handle = self
            .notification(alert)
            .show()
            .map_err(|e| NotifyError::Rejected(e.to_string()))?;
        let notification_id = handle.id();

        let alert_id = alert.id;
        std::thread::Builder::new()
            .name(format!("alert-{}-actions", alert_id))
            .spawn(move || {
                // Returns once the popup is acted on, closed, or times out
                notify_rust::handle_action(notification_id, move |response: &notify_rust::ActionResponse<'_>| {
                    if matches!(response, notify_rust::ActionResponse::Custom(action) if *action == START_ANOTHER_ACTION) {
                        debug!("Desktop action picked on alert {}", alert_id);
                        on_action();
                    }
                });
            })
            .map_err(|e| NotifyError::Rejected(e.to_string()))?;

        if let Ok(mut shown) = self.shown.lock() {
            shown.insert(alert_id, handle);
        }
        Ok(())
    }

    fn close(&self, alert_id: u64) {
        let handle = match self.shown.lock() {
            Ok(mut shown) => shown.remove(&alert_id),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            debug!("Closing desktop notification for alert {}", alert_id);
            handle.close();
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
impl Notifier for DesktopNotifier {
    fn show(&self, alert: &CompletionAlert, _on_action: OnAlertAction) -> Result<(), NotifyError> {
        debug!("Showing desktop notification for alert {}", alert.id);

        self.notification(alert)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::Rejected(e.to_string()))
    }

    fn close(&self, _alert_id: u64) {}
}

/// Used when desktop notifications are turned off
#[derive(Debug, Clone, Default)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn show(&self, _alert: &CompletionAlert, _on_action: OnAlertAction) -> Result<(), NotifyError> {
        Err(NotifyError::Disabled)
    }

    fn close(&self, _alert_id: u64) {}
}
