//! Completion alert auto-dismiss task

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::state::AppState;

/// Background task that removes an alert nobody answered within `timeout`
pub async fn alert_expiry_task(state: Arc<AppState>, alert_id: u64, timeout: Duration) {
    sleep(timeout).await;

    match state.dismiss_alert(alert_id) {
        Ok(true) => info!("Completion alert {} expired", alert_id),
        Ok(false) => {
            // Already dismissed, acted on, or replaced
        }
        Err(e) => warn!("Failed to expire alert {}: {}", alert_id, e),
    }
}
