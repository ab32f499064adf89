//! Background tasks module
//!
//! This module contains the tasks the daemon spawns next to the HTTP server.

pub mod alert_expiry;
pub mod ticker;

// Re-export main functions
pub use alert_expiry::alert_expiry_task;
pub use ticker::ticker_task;
