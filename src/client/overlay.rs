//! Self-contained overlay countdown
//!
//! Runs its own `TimerMachine` with its own ticker and never talks to the
//! daemon. Finishing a session asks for an explicit acknowledgment before
//! the overlay accepts more input. Everything is dropped when it closes.

use std::{
    io::{self, Write},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{interval_at, Instant, Interval},
};
use tracing::debug;

use super::{audio::AudioCue, ClientError};
use crate::state::{format_mmss, TickOutcome, TimerMachine, Transition};

/// A line typed into the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayInput {
    Start,
    Reset,
    Close,
    Unknown(String),
}

impl OverlayInput {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "s" | "start" => OverlayInput::Start,
            "r" | "reset" => OverlayInput::Reset,
            "c" | "close" | "q" | "quit" => OverlayInput::Close,
            other => OverlayInput::Unknown(other.to_string()),
        }
    }
}

/// Overlay timer plus its optional ticker
pub struct Overlay {
    machine: TimerMachine,
    ticker: Option<Interval>,
}

impl Overlay {
    pub fn new(minutes: u64) -> Self {
        Self {
            machine: TimerMachine::new(minutes),
            ticker: None,
        }
    }

    pub fn machine(&self) -> &TimerMachine {
        &self.machine
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn display(&self) -> String {
        format_mmss(self.machine.remaining_seconds())
    }

    /// Apply a typed command. Returns false when the overlay should close.
    pub fn handle(&mut self, input: &OverlayInput) -> bool {
        match input {
            OverlayInput::Start => {
                if self.machine.start(None) == Transition::Started {
                    let period = Duration::from_secs(1);
                    self.ticker = Some(interval_at(Instant::now() + period, period));
                }
                true
            }
            OverlayInput::Reset => {
                self.machine.reset(None);
                self.ticker = None;
                true
            }
            OverlayInput::Close => false,
            OverlayInput::Unknown(_) => true,
        }
    }

    /// Wait for the next tick; pends forever while stopped
    async fn next_tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Consume one second of the overlay countdown
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.machine.tick();
        if !matches!(outcome, TickOutcome::Counted { .. }) {
            self.ticker = None;
        }
        outcome
    }
}

fn redraw(overlay: &Overlay) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "\r{}  ", overlay.display())?;
    stdout.flush()
}

/// Run the overlay on the terminal until the user closes it or stdin ends
pub async fn run(minutes: u64) -> Result<(), ClientError> {
    let mut overlay = Overlay::new(minutes);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let audio = AudioCue::detect(true);

    println!("Pomodoro Timer  (s = start, r = reset, c = close)");
    redraw(&overlay)?;

    loop {
        tokio::select! {
            _ = overlay.next_tick() => {
                match overlay.tick() {
                    TickOutcome::Counted { .. } => redraw(&overlay)?,
                    TickOutcome::Completed { .. } => {
                        println!("\rPomodoro finished! Press Enter to continue.");
                        audio.play_completion().await;
                        // Blocks until acknowledged; the countdown is already stopped
                        if lines.next_line().await?.is_none() {
                            break;
                        }
                        redraw(&overlay)?;
                    }
                    TickOutcome::Ignored => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed, closing overlay");
                    break;
                };
                let input = OverlayInput::parse(&line);
                if let OverlayInput::Unknown(other) = &input {
                    if !other.is_empty() {
                        println!("Unknown command '{}' (s = start, r = reset, c = close)", other);
                    }
                }
                if !overlay.handle(&input) {
                    break;
                }
                redraw(&overlay)?;
            }
        }
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimerPhase;

    #[test]
    fn parses_short_and_long_commands() {
        assert_eq!(OverlayInput::parse("s"), OverlayInput::Start);
        assert_eq!(OverlayInput::parse(" Start \n"), OverlayInput::Start);
        assert_eq!(OverlayInput::parse("r"), OverlayInput::Reset);
        assert_eq!(OverlayInput::parse("q"), OverlayInput::Close);
        assert_eq!(OverlayInput::parse("c"), OverlayInput::Close);
        assert_eq!(
            OverlayInput::parse("zzz"),
            OverlayInput::Unknown("zzz".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_counts_down_to_completion_and_reloads() {
        let mut overlay = Overlay::new(1);
        assert_eq!(overlay.display(), "01:00");
        assert!(overlay.handle(&OverlayInput::Start));
        assert!(overlay.is_ticking());

        // Starting twice keeps the same single ticker running
        overlay.handle(&OverlayInput::Start);

        let mut completed = 0;
        for _ in 0..60 {
            overlay.next_tick().await;
            if let TickOutcome::Completed { .. } = overlay.tick() {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
        assert!(!overlay.is_ticking());
        assert_eq!(overlay.display(), "01:00");
        assert_eq!(overlay.machine().phase(), TimerPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_and_reloads() {
        let mut overlay = Overlay::new(25);
        overlay.handle(&OverlayInput::Start);
        for _ in 0..3 {
            overlay.next_tick().await;
            overlay.tick();
        }
        assert_eq!(overlay.display(), "24:57");

        overlay.handle(&OverlayInput::Reset);
        assert!(!overlay.is_ticking());
        assert_eq!(overlay.display(), "25:00");
    }

    #[test]
    fn close_ends_the_overlay() {
        let mut overlay = Overlay::new(25);
        assert!(!overlay.handle(&OverlayInput::Close));
    }
}
