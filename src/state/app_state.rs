//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{
    alert::{CompletionAlert, ALERT_TIMEOUT_SECS},
    machine::{TickOutcome, TimerMachine, Transition},
    TimerSnapshot,
};
use crate::{
    protocol::{AlertCleared, PushEvent, SessionComplete},
    services::{
        settings::{load_configured_minutes, save_configured_minutes},
        Notifier, NotifyError, OnAlertAction, SettingsStore,
    },
    tasks::{alert_expiry_task, ticker_task},
};

/// Capacity of the push channel; slow clients skip ahead rather than block
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The countdown plus the handle of the task currently ticking it
#[derive(Debug)]
struct Session {
    machine: TimerMachine,
    ticker: Option<JoinHandle<()>>,
    /// Bumped whenever a ticker is scheduled or cancelled; ticks from any
    /// other generation are ignored
    generation: u64,
}

#[derive(Debug, Default)]
struct AlertSlot {
    current: Option<CompletionAlert>,
    next_id: u64,
}

/// Daemon state: the single timer, its alert, and the push channel
pub struct AppState {
    session: Mutex<Session>,
    alert: Mutex<AlertSlot>,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    /// Channel for pushing updates to connected clients
    events_tx: broadcast::Sender<PushEvent>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last command tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Create the state, hydrating the session length from the settings store
    pub fn new(
        port: u16,
        host: String,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let minutes = load_configured_minutes(settings.as_ref());
        Self::with_machine(port, host, TimerMachine::new(minutes), settings, notifier)
    }

    /// Create the state around an already built machine
    pub fn with_machine(
        port: u16,
        host: String,
        machine: TimerMachine,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            session: Mutex::new(Session {
                machine,
                ticker: None,
                generation: 0,
            }),
            alert: Mutex::new(AlertSlot::default()),
            settings,
            notifier,
            events_tx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    /// Subscribe to pushed events
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events_tx.subscribe()
    }

    /// Get the current timer snapshot
    pub fn get_timer_state(&self) -> Result<TimerSnapshot, String> {
        self.session
            .lock()
            .map(|session| session.machine.snapshot())
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Wall-clock anchor of the running interval, if any
    pub fn started_at_epoch_ms(&self) -> Result<Option<i64>, String> {
        self.session
            .lock()
            .map(|session| session.machine.started_at_epoch_ms())
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Start or resume the countdown
    pub fn start(self: &Arc<Self>, minutes: Option<u64>) -> Result<Transition, String> {
        self.apply("start", minutes.is_some(), |machine| machine.start(minutes))
    }

    /// Pause a running countdown
    pub fn pause(self: &Arc<Self>) -> Result<Transition, String> {
        self.apply("pause", false, |machine| machine.pause())
    }

    /// Stop and reload the full session
    pub fn reset(self: &Arc<Self>, minutes: Option<u64>) -> Result<Transition, String> {
        self.apply("reset", minutes.is_some(), |machine| machine.reset(minutes))
    }

    /// Change the configured session length
    pub fn set_configured_minutes(self: &Arc<Self>, minutes: u64) -> Result<Transition, String> {
        self.apply("update-minutes", true, |machine| {
            machine.set_configured_minutes(minutes)
        })
    }

    /// Apply a command under the session lock, keep the ticker in step with
    /// `running`, then persist and broadcast outside the lock
    fn apply<F>(self: &Arc<Self>, action: &str, persist: bool, command: F) -> Result<Transition, String>
    where
        F: FnOnce(&mut TimerMachine) -> Transition,
    {
        let mut session = self.session.lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;

        let was_running = session.machine.is_running();
        let transition = command(&mut session.machine);

        match (was_running, session.machine.is_running()) {
            (false, true) => self.schedule_ticker(&mut session),
            (true, false) => Self::cancel_ticker(&mut session),
            _ => {}
        }

        let snapshot = session.machine.snapshot();
        let minutes = session.machine.configured_minutes();
        drop(session); // Release the lock early

        self.record_action(action);
        debug!("{} -> {:?} ({:?})", action, transition, snapshot);

        // Ignored commands (start while running) leave the stored length alone
        if transition.changed() {
            if persist {
                self.persist_minutes(minutes);
            }
            self.publish(PushEvent::TimerUpdate(snapshot));
        }

        Ok(transition)
    }

    /// Apply one tick on behalf of the ticker of the given generation
    pub fn tick(self: &Arc<Self>, generation: u64) -> Result<TickOutcome, String> {
        let mut session = self.session.lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;

        if session.generation != generation {
            debug!("Dropping tick from stale ticker {}", generation);
            return Ok(TickOutcome::Ignored);
        }

        let outcome = session.machine.tick();
        if let TickOutcome::Completed { .. } = outcome {
            // The completing ticker exits on its own; only forget its handle
            session.ticker = None;
            session.generation += 1;
        }
        let snapshot = session.machine.snapshot();
        let minutes = session.machine.configured_minutes();
        drop(session);

        match outcome {
            TickOutcome::Ignored => {}
            TickOutcome::Counted { .. } => self.publish(PushEvent::TimerUpdate(snapshot)),
            TickOutcome::Completed { .. } => {
                info!("Session of {} min complete", minutes);
                self.publish(PushEvent::TimerUpdate(snapshot));
                self.publish(PushEvent::SessionComplete(SessionComplete {
                    configured_minutes: minutes,
                }));
                self.raise_alert(minutes);
            }
        }

        Ok(outcome)
    }

    /// Generation of the currently scheduled ticker (if any)
    pub fn ticker_generation(&self) -> Result<Option<u64>, String> {
        self.session
            .lock()
            .map(|session| session.ticker.as_ref().map(|_| session.generation))
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    fn schedule_ticker(self: &Arc<Self>, session: &mut Session) {
        Self::cancel_ticker(session);
        let generation = session.generation;
        debug!("Scheduling ticker {}", generation);
        session.ticker = Some(tokio::spawn(ticker_task(Arc::clone(self), generation)));
    }

    fn cancel_ticker(session: &mut Session) {
        if let Some(handle) = session.ticker.take() {
            debug!("Cancelling ticker {}", session.generation);
            handle.abort();
        }
        session.generation += 1;
    }

    /// Get the alert currently on display
    pub fn current_alert(&self) -> Result<Option<CompletionAlert>, String> {
        self.alert
            .lock()
            .map(|slot| slot.current.clone())
            .map_err(|e| format!("Failed to lock alert state: {}", e))
    }

    fn raise_alert(self: &Arc<Self>, configured_minutes: u64) {
        let (alert, replaced) = match self.alert.lock() {
            Ok(mut slot) => {
                slot.next_id += 1;
                let alert = CompletionAlert::new(slot.next_id, configured_minutes);
                let replaced = slot.current.replace(alert.clone());
                (alert, replaced)
            }
            Err(e) => {
                error!("Failed to lock alert state: {}", e);
                return;
            }
        };

        if let Some(old) = replaced {
            self.notifier.close(old.id);
            self.publish(PushEvent::AlertCleared(AlertCleared { id: old.id }));
        }
        info!("Raising completion alert {}", alert.id);
        self.publish(PushEvent::Alert(alert.clone()));

        match self.notifier.show(&alert, self.alert_action(alert.id)) {
            Ok(()) => {}
            Err(NotifyError::Disabled) => debug!("Desktop notifications disabled, skipping"),
            Err(e) => warn!("Desktop notification failed: {}", e),
        }

        tokio::spawn(alert_expiry_task(
            Arc::clone(self),
            alert.id,
            Duration::from_secs(ALERT_TIMEOUT_SECS),
        ));
    }

    /// Callback handed to the desktop mirror; it fires on a notifier thread,
    /// outside the runtime
    fn alert_action(self: &Arc<Self>, id: u64) -> OnAlertAction {
        let state = Arc::downgrade(self);
        let runtime = Handle::current();
        Box::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let _guard = runtime.enter();
            match state.start_another(id) {
                Ok(true) => {}
                Ok(false) => debug!("Desktop action on stale alert {}", id),
                Err(e) => warn!("Failed to act on alert {}: {}", id, e),
            }
        })
    }

    /// Remove the alert with the given id. Returns false if it is no longer shown.
    pub fn dismiss_alert(&self, id: u64) -> Result<bool, String> {
        let mut slot = self.alert.lock()
            .map_err(|e| format!("Failed to lock alert state: {}", e))?;

        if slot.current.as_ref().map(|a| a.id) != Some(id) {
            return Ok(false);
        }
        slot.current = None;
        drop(slot);

        self.notifier.close(id);
        self.publish(PushEvent::AlertCleared(AlertCleared { id }));
        Ok(true)
    }

    /// The alert's action: clear it and start a session of the configured length
    pub fn start_another(self: &Arc<Self>, id: u64) -> Result<bool, String> {
        if !self.dismiss_alert(id)? {
            return Ok(false);
        }
        info!("Starting another session from alert {}", id);
        self.start(None)?;
        Ok(true)
    }

    fn persist_minutes(&self, minutes: u64) {
        match save_configured_minutes(self.settings.as_ref(), minutes) {
            Ok(()) => debug!("Persisted configured length: {} min", minutes),
            Err(e) => warn!("Failed to persist configured length: {}", e),
        }
    }

    /// Best-effort broadcast; nobody listening is not an error
    fn publish(&self, event: PushEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("No clients connected, update dropped");
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last) = self.last_action.lock() {
            *last = Some((action.to_string(), Utc::now()));
        }
    }

    /// Get last command information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|last| last.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
