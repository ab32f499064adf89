//! State management module
//!
//! This module contains the timer state machine, the alert record, and the
//! shared daemon state that owns both.

pub mod alert;
pub mod app_state;
pub mod dispatch;
pub mod machine;
pub mod timer_state;

// Re-export main types
pub use alert::CompletionAlert;
pub use app_state::AppState;
pub use dispatch::dispatch;
pub use machine::{TickOutcome, TimerMachine, Transition};
pub use timer_state::{format_mmss, TimerPhase, TimerSnapshot};
