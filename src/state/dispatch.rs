//! Command dispatch

use std::sync::Arc;
use tracing::info;

use super::{machine::DEFAULT_MINUTES, AppState};
use crate::protocol::{Ack, Command, Reply};

/// Apply one client command to the daemon state
pub fn dispatch(state: &Arc<AppState>, command: Command) -> Result<Reply, String> {
    info!("Handling {}", command.name());

    match command {
        Command::GetTimerState => state.get_timer_state().map(Reply::State),
        Command::StartTimer { minutes } => state.start(minutes).map(|_| Reply::Ack(Ack::ok())),
        Command::PauseTimer => state.pause().map(|_| Reply::Ack(Ack::ok())),
        Command::ResetTimer { minutes } => state.reset(minutes).map(|_| Reply::Ack(Ack::ok())),
        Command::UpdateMinutes { minutes } => state
            .set_configured_minutes(minutes.unwrap_or(DEFAULT_MINUTES))
            .map(|_| Reply::Ack(Ack::ok())),
    }
}
