//! Completion sound for clients that have an audio output
//!
//! The daemon cannot make sound itself; it pushes `sessionComplete` and any
//! open client that owns a terminal rings the bell.

use std::{
    io::{self, IsTerminal, Write},
    time::Duration,
};
use tokio::time::sleep;
use tracing::{debug, warn};

const BEEPS: usize = 3;
const BEEP_SPACING: Duration = Duration::from_millis(600);

/// Audio output of a client, if it has one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Ring the terminal bell
    Bell,
    /// No way to make sound; alerts stay visual
    Silent,
}

impl AudioCue {
    /// Use the bell when stdout is a terminal and sound was not turned off
    pub fn detect(enabled: bool) -> Self {
        if !enabled {
            debug!("Sound disabled by flag");
            return AudioCue::Silent;
        }
        if io::stdout().is_terminal() {
            AudioCue::Bell
        } else {
            warn!("No terminal attached, completion alerts will be visual only");
            AudioCue::Silent
        }
    }

    /// Play the completion cue: three beeps, 600 ms apart
    pub async fn play_completion(self) {
        if self == AudioCue::Silent {
            return;
        }

        for i in 0..BEEPS {
            if i > 0 {
                sleep(BEEP_SPACING).await;
            }
            let mut stdout = io::stdout();
            if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
                warn!("Failed to ring bell: {}", e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sound_is_silent() {
        assert_eq!(AudioCue::detect(false), AudioCue::Silent);
    }

    #[tokio::test]
    async fn silent_cue_returns_immediately() {
        AudioCue::Silent.play_completion().await;
    }
}
