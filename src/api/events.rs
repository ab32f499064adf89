//! Server-sent event stream of timer updates

use std::{convert::Infallible, sync::Arc, time::Duration};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{stream, Stream, StreamExt};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, error, warn};

use crate::{protocol::PushEvent, state::AppState};

/// Handle GET /events - Push stream, starting with the current snapshot
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Client subscribed to events");

    // Subscribe before reading the snapshot so no update falls in between
    let rx = state.subscribe();
    let initial = state.get_timer_state().ok().map(PushEvent::TimerUpdate);

    let updates = stream::unfold((rx, state), |(mut rx, state)| async move {
        let events = next_events(&mut rx, &state).await?;
        Some((stream::iter(events), (rx, state)))
    })
    .flatten();

    let events = stream::iter(initial)
        .chain(updates)
        .filter_map(|event| async move { to_sse(&event).map(Ok::<_, Infallible>) });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

async fn next_events(rx: &mut Receiver<PushEvent>, state: &AppState) -> Option<Vec<PushEvent>> {
    match rx.recv().await {
        Ok(event) => Some(vec![event]),
        Err(RecvError::Lagged(skipped)) => {
            warn!("Event client lagged by {} updates, resyncing", skipped);
            Some(resync(state))
        }
        Err(RecvError::Closed) => None,
    }
}

/// Current snapshot plus the alert on display, standing in for skipped events
fn resync(state: &AppState) -> Vec<PushEvent> {
    let mut events: Vec<PushEvent> = state
        .get_timer_state()
        .ok()
        .map(PushEvent::TimerUpdate)
        .into_iter()
        .collect();
    match state.current_alert() {
        Ok(Some(alert)) => events.push(PushEvent::Alert(alert)),
        Ok(None) => {}
        Err(e) => error!("Failed to read alert while resyncing: {}", e),
    }
    events
}

/// Encode a push event as an SSE frame
pub fn to_sse(event: &PushEvent) -> Option<Event> {
    match event.data() {
        Ok(data) => Some(Event::default().event(event.name()).data(data)),
        Err(e) => {
            error!("Failed to encode {} event: {}", event.name(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{DisabledNotifier, MemoryStore},
        state::TimerMachine,
    };
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn lagging_client_is_resent_the_live_alert() {
        let state = Arc::new(AppState::with_machine(
            0,
            "127.0.0.1".to_string(),
            TimerMachine::with_configured_seconds(1),
            Arc::new(MemoryStore::new()),
            Arc::new(DisabledNotifier),
        ));
        let mut rx = state.subscribe();

        state.start(None).unwrap();
        sleep(Duration::from_millis(1_500)).await;
        let alert = state.current_alert().unwrap().expect("alert raised");

        // Overflow the channel so the alert event itself is lost
        for minutes in 1..=70 {
            state.set_configured_minutes(minutes).unwrap();
        }

        let events = next_events(&mut rx, &state).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            PushEvent::TimerUpdate(snapshot) if snapshot.configured_seconds == 70 * 60
        ));
        assert_eq!(events[1], PushEvent::Alert(alert));
    }

    #[tokio::test]
    async fn resync_without_alert_is_just_the_snapshot() {
        let state = AppState::with_machine(
            0,
            "127.0.0.1".to_string(),
            TimerMachine::with_configured_seconds(90),
            Arc::new(MemoryStore::new()),
            Arc::new(DisabledNotifier),
        );

        let events = resync(&state);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            PushEvent::TimerUpdate(snapshot) if snapshot.remaining_seconds == 90
        ));
    }
}
