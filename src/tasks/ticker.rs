//! One-second ticker background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info};

use crate::state::{machine::TickOutcome, AppState};

/// Period between ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task that feeds one tick per second into the timer until the
/// session completes, the timer stops, or the task is aborted
pub async fn ticker_task(state: Arc<AppState>, generation: u64) {
    debug!("Starting ticker {}", generation);

    // First tick lands one full period after start
    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);

    loop {
        interval.tick().await;

        match state.tick(generation) {
            Ok(TickOutcome::Counted { remaining }) => {
                debug!("Tick {}: {}s remaining", generation, remaining);
            }
            Ok(TickOutcome::Completed { configured_seconds }) => {
                info!("Ticker {} finished a {}s session", generation, configured_seconds);
                break;
            }
            Ok(TickOutcome::Ignored) => {
                debug!("Ticker {} no longer current, exiting", generation);
                break;
            }
            Err(e) => {
                error!("Failed to apply tick: {}", e);
                break;
            }
        }
    }
}
