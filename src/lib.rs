//! Pomodoro Keeper - A state-managed Pomodoro timer daemon
//!
//! One long-lived daemon owns a single countdown. Short-lived clients read
//! its state, send the four timer commands, and follow pushed updates. A
//! completion alert is raised whenever a session reaches zero.

pub mod api;
pub mod client;
pub mod config;
pub mod protocol;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, TimerMachine};
pub use utils::signals::shutdown_signal;
