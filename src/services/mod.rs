//! Collaborators the timer talks to but does not own
//!
//! Settings persistence and desktop notifications both degrade quietly:
//! a failure is logged and the timer state stays correct.

pub mod notifier;
pub mod settings;

pub use notifier::{OnAlertAction, DesktopNotifier, DisabledNotifier, Notifier, NotifyError};
pub use settings::{JsonFileStore, MemoryStore, SettingsError, SettingsStore};
