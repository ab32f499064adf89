//! Utility functions module
//!
//! Signal handling shared by the daemon and the long-running clients.

pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
