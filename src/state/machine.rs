//! Countdown state machine
//!
//! `TimerMachine` holds the whole timing truth for one session and knows
//! nothing about scheduling: whoever owns it calls `tick()` once per second
//! while it reports `running`. The daemon drives it from a tokio task, the
//! overlay client drives its own private copy.

use chrono::Utc;

use super::timer_state::{TimerPhase, TimerSnapshot};

/// Session length used when nothing else is configured (25 minutes)
pub const DEFAULT_MINUTES: u64 = 25;

/// Result of applying a command to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The command was valid but nothing observable changed
    Unchanged,
    /// Observable state changed; the countdown is not running
    Stopped,
    /// The countdown is now running (a tick source must be scheduled)
    Started,
}

impl Transition {
    pub fn changed(self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick arrived while not running, nothing to do
    Ignored,
    /// One second was consumed, `remaining` seconds are left
    Counted { remaining: u64 },
    /// The session hit zero and the machine already settled back into Idle
    Completed { configured_seconds: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerMachine {
    remaining_seconds: u64,
    configured_seconds: u64,
    running: bool,
    started_at_epoch_ms: Option<i64>,
}

impl TimerMachine {
    /// Create an idle machine for the given session length in minutes
    pub fn new(configured_minutes: u64) -> Self {
        Self::with_configured_seconds(minutes_to_seconds(configured_minutes))
    }

    /// Create an idle machine with a session length in seconds.
    /// Zero is bumped to one second so a session always has a length.
    pub fn with_configured_seconds(configured_seconds: u64) -> Self {
        let configured_seconds = configured_seconds.max(1);
        Self {
            remaining_seconds: configured_seconds,
            configured_seconds,
            running: false,
            started_at_epoch_ms: None,
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn configured_seconds(&self) -> u64 {
        self.configured_seconds
    }

    /// Configured session length in whole minutes (the persisted unit)
    pub fn configured_minutes(&self) -> u64 {
        (self.configured_seconds / 60).max(1)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn started_at_epoch_ms(&self) -> Option<i64> {
        self.started_at_epoch_ms
    }

    pub fn phase(&self) -> TimerPhase {
        self.snapshot().phase()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            remaining_seconds: self.remaining_seconds,
            configured_seconds: self.configured_seconds,
            running: self.running,
        }
    }

    /// Begin or resume the countdown, optionally switching the session length first
    pub fn start(&mut self, minutes: Option<u64>) -> Transition {
        if self.running {
            return Transition::Unchanged;
        }

        if let Some(minutes) = minutes {
            let idle = self.remaining_seconds == self.configured_seconds;
            self.apply_configured(minutes_to_seconds(minutes));
            // A fresh session runs for the length it was started with
            if idle {
                self.remaining_seconds = self.configured_seconds;
            }
        }
        if self.remaining_seconds == 0 {
            self.remaining_seconds = self.configured_seconds;
        }

        self.running = true;
        self.started_at_epoch_ms = Some(Utc::now().timestamp_millis());
        Transition::Started
    }

    /// Stop decrementing while keeping the remaining time
    pub fn pause(&mut self) -> Transition {
        if !self.running {
            return Transition::Unchanged;
        }

        self.running = false;
        self.started_at_epoch_ms = None;
        Transition::Stopped
    }

    /// Stop and reload the full session, optionally switching its length
    pub fn reset(&mut self, minutes: Option<u64>) -> Transition {
        let before = self.clone();

        if let Some(minutes) = minutes {
            self.apply_configured(minutes_to_seconds(minutes));
        }
        self.running = false;
        self.started_at_epoch_ms = None;
        self.remaining_seconds = self.configured_seconds;

        if *self == before {
            Transition::Unchanged
        } else {
            Transition::Stopped
        }
    }

    /// Change the session length. An idle or paused countdown is reloaded
    /// so the display follows the new value; a running one keeps going.
    pub fn set_configured_minutes(&mut self, minutes: u64) -> Transition {
        let before = self.clone();

        self.apply_configured(minutes_to_seconds(minutes));
        if !self.running {
            self.remaining_seconds = self.configured_seconds;
        }

        match (*self == before, self.running) {
            (true, _) => Transition::Unchanged,
            (false, true) => Transition::Started,
            (false, false) => Transition::Stopped,
        }
    }

    /// Consume one second. Reaching zero stops the countdown and reloads the
    /// configured length in the same step, so `Completed` is only ever seen
    /// through the returned outcome.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Counted {
                remaining: self.remaining_seconds,
            };
        }

        self.running = false;
        self.started_at_epoch_ms = None;
        self.remaining_seconds = self.configured_seconds;
        TickOutcome::Completed {
            configured_seconds: self.configured_seconds,
        }
    }

    fn apply_configured(&mut self, configured_seconds: u64) {
        self.configured_seconds = configured_seconds.max(1);
        // A shorter session must not leave more time on the clock than it allows
        self.remaining_seconds = self.remaining_seconds.min(self.configured_seconds);
    }
}

impl Default for TimerMachine {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES)
    }
}

fn minutes_to_seconds(minutes: u64) -> u64 {
    minutes.max(1).saturating_mul(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(machine: &mut TimerMachine, count: u64) -> Vec<TickOutcome> {
        (0..count).map(|_| machine.tick()).collect()
    }

    #[test]
    fn default_machine_is_idle_for_twenty_five_minutes() {
        let machine = TimerMachine::default();
        assert_eq!(machine.remaining_seconds(), 1500);
        assert_eq!(machine.configured_seconds(), 1500);
        assert!(!machine.is_running());
        assert_eq!(machine.phase(), TimerPhase::Idle);
        assert_eq!(machine.started_at_epoch_ms(), None);
    }

    #[test]
    fn full_session_completes_exactly_once_for_several_lengths() {
        for duration in [1u64, 2, 5, 61, 300] {
            let mut machine = TimerMachine::with_configured_seconds(duration);
            assert_eq!(machine.start(None), Transition::Started);

            let outcomes = run_ticks(&mut machine, duration);
            let completions = outcomes
                .iter()
                .filter(|o| matches!(o, TickOutcome::Completed { .. }))
                .count();
            assert_eq!(completions, 1, "duration {}", duration);
            assert_eq!(
                outcomes.last(),
                Some(&TickOutcome::Completed {
                    configured_seconds: duration
                })
            );
            assert_eq!(machine.phase(), TimerPhase::Idle);
            assert_eq!(machine.remaining_seconds(), duration);
            assert!(!machine.is_running());

            // Further ticks after completion do nothing
            assert_eq!(machine.tick(), TickOutcome::Ignored);
        }
    }

    #[test]
    fn pause_then_start_resumes_from_same_second() {
        let mut machine = TimerMachine::with_configured_seconds(10);
        machine.start(None);
        run_ticks(&mut machine, 3);
        assert_eq!(machine.pause(), Transition::Stopped);
        assert_eq!(machine.remaining_seconds(), 7);
        assert_eq!(machine.phase(), TimerPhase::Paused);
        assert_eq!(machine.started_at_epoch_ms(), None);

        assert_eq!(machine.tick(), TickOutcome::Ignored);
        assert_eq!(machine.start(None), Transition::Started);
        assert_eq!(machine.remaining_seconds(), 7);
        assert_eq!(machine.tick(), TickOutcome::Counted { remaining: 6 });
    }

    #[test]
    fn start_while_running_keeps_remaining_time() {
        let mut machine = TimerMachine::with_configured_seconds(10);
        machine.start(None);
        run_ticks(&mut machine, 4);
        assert_eq!(machine.start(Some(50)), Transition::Unchanged);
        assert_eq!(machine.remaining_seconds(), 6);
        assert_eq!(machine.configured_seconds(), 10);
    }

    #[test]
    fn pause_when_not_running_is_a_no_op() {
        let mut machine = TimerMachine::default();
        assert_eq!(machine.pause(), Transition::Unchanged);
        assert_eq!(machine.phase(), TimerPhase::Idle);
    }

    #[test]
    fn reset_always_restores_full_session() {
        let mut running = TimerMachine::with_configured_seconds(30);
        running.start(None);
        run_ticks(&mut running, 5);

        let mut paused = running.clone();
        paused.pause();

        let idle = TimerMachine::with_configured_seconds(30);

        for mut machine in [running, paused, idle] {
            machine.reset(None);
            assert_eq!(machine.remaining_seconds(), machine.configured_seconds());
            assert!(!machine.is_running());
            assert_eq!(machine.phase(), TimerPhase::Idle);
        }
    }

    #[test]
    fn reset_on_idle_machine_reports_unchanged() {
        let mut machine = TimerMachine::default();
        assert_eq!(machine.reset(None), Transition::Unchanged);
        assert_eq!(machine.reset(Some(25)), Transition::Unchanged);
        assert_eq!(machine.reset(Some(10)), Transition::Stopped);
        assert_eq!(machine.remaining_seconds(), 600);
    }

    #[test]
    fn start_with_minutes_switches_session_length() {
        let mut machine = TimerMachine::default();
        machine.start(Some(10));
        assert_eq!(machine.configured_seconds(), 600);
        assert_eq!(machine.remaining_seconds(), 600);
        assert_eq!(machine.configured_minutes(), 10);
    }

    #[test]
    fn start_from_idle_with_longer_length_runs_full_session() {
        let mut machine = TimerMachine::new(10);
        assert_eq!(machine.start(Some(25)), Transition::Started);
        assert_eq!(machine.configured_seconds(), 1500);
        assert_eq!(machine.remaining_seconds(), 1500);
        assert_eq!(machine.phase(), TimerPhase::Running);
    }

    #[test]
    fn start_from_pause_with_minutes_keeps_progress() {
        let mut machine = TimerMachine::new(10);
        machine.start(None);
        run_ticks(&mut machine, 30);
        machine.pause();

        machine.start(Some(25));
        assert_eq!(machine.configured_seconds(), 1500);
        assert_eq!(machine.remaining_seconds(), 570);
    }

    #[test]
    fn set_minutes_while_idle_updates_remaining() {
        let mut machine = TimerMachine::default();
        assert_eq!(machine.set_configured_minutes(10), Transition::Stopped);
        assert_eq!(machine.remaining_seconds(), 600);
        assert_eq!(machine.configured_seconds(), 600);
    }

    #[test]
    fn set_minutes_while_running_keeps_countdown() {
        let mut machine = TimerMachine::default();
        machine.start(None);
        run_ticks(&mut machine, 10);
        assert_eq!(machine.set_configured_minutes(30), Transition::Started);
        assert_eq!(machine.remaining_seconds(), 1490);
        assert!(machine.is_running());

        // Shrinking below the remaining time clamps it
        machine.set_configured_minutes(1);
        assert_eq!(machine.remaining_seconds(), 60);
    }

    #[test]
    fn start_after_completion_reuses_last_configured_length() {
        let mut machine = TimerMachine::default();
        machine.start(Some(1));
        let outcomes = run_ticks(&mut machine, 60);
        assert!(matches!(outcomes.last(), Some(TickOutcome::Completed { .. })));

        machine.start(None);
        assert_eq!(machine.remaining_seconds(), 60);
        assert_eq!(machine.configured_seconds(), 60);
    }

    #[test]
    fn zero_minutes_is_clamped_to_one() {
        let mut machine = TimerMachine::new(0);
        assert_eq!(machine.configured_seconds(), 60);
        machine.set_configured_minutes(0);
        assert_eq!(machine.configured_minutes(), 1);
    }

    #[test]
    fn start_records_wall_clock_anchor() {
        let mut machine = TimerMachine::default();
        let before = Utc::now().timestamp_millis();
        machine.start(None);
        let anchor = machine.started_at_epoch_ms().unwrap();
        assert!(anchor >= before);
        machine.reset(None);
        assert_eq!(machine.started_at_epoch_ms(), None);
    }
}
