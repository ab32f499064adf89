//! Short-lived clients of the daemon
//!
//! Clients never keep their own idea of the time left: they hydrate from
//! `getTimerState`, send commands, and redraw from pushed updates. The one
//! exception is the overlay, which runs a private countdown.

pub mod audio;
pub mod http;
pub mod overlay;
pub mod sse;
pub mod view;

use std::io::{self, Write};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    config::{AlertAction, Commands, Config},
    protocol::{parse_minutes, Ack, Command, PushEvent},
    state::{machine::DEFAULT_MINUTES, CompletionAlert},
    utils::shutdown_signal,
};
pub use audio::AudioCue;
pub use http::{ClientError, DaemonClient, EventStream};
pub use view::PopupView;

/// Turn a typed minutes value into whole minutes, falling back to the default
pub fn minutes_arg(raw: &str) -> u64 {
    parse_minutes(&Value::String(raw.to_string())).unwrap_or(DEFAULT_MINUTES)
}

/// Run one client subcommand against the daemon
pub async fn run(config: &Config, command: Commands) -> Result<(), ClientError> {
    if let Commands::Overlay { minutes } = command {
        return overlay::run(minutes_arg(&minutes)).await;
    }

    let client = DaemonClient::new(config.base_url())?;

    match command {
        Commands::Status => {
            let snapshot = client.timer_state().await?;
            println!("{}", PopupView::from_snapshot(&snapshot));
            if let Some(alert) = client.alert().await? {
                print_alert(&alert);
            }
        }
        Commands::Start { minutes } => {
            let minutes = minutes.as_deref().map(minutes_arg);
            report("start", client.command(&Command::StartTimer { minutes }).await?);
        }
        Commands::Pause => {
            report("pause", client.command(&Command::PauseTimer).await?);
        }
        Commands::Reset { minutes } => {
            let minutes = minutes.as_deref().map(minutes_arg);
            report("reset", client.command(&Command::ResetTimer { minutes }).await?);
        }
        Commands::Minutes { minutes } => {
            let minutes = Some(minutes_arg(&minutes));
            report("minutes", client.command(&Command::UpdateMinutes { minutes }).await?);
        }
        Commands::Watch { no_sound } => watch(&client, AudioCue::detect(!no_sound)).await?,
        Commands::Alert { action } => alert(&client, action).await?,
        Commands::Serve(_) | Commands::Overlay { .. } => {}
    }

    Ok(())
}

fn report(what: &str, ack: Ack) {
    if ack.success {
        println!("{}: ok", what);
    } else {
        println!("{}: not applied", what);
    }
}

fn print_alert(alert: &CompletionAlert) {
    println!("{}", alert.title);
    println!("{}", alert.body);
    println!(
        "  -> `pomodoro-keeper alert start-another` ({}) or `alert dismiss`",
        alert.action_label
    );
}

async fn alert(client: &DaemonClient, action: AlertAction) -> Result<(), ClientError> {
    let Some(current) = client.alert().await? else {
        println!("No alert on display");
        return Ok(());
    };

    match action {
        AlertAction::Show => print_alert(&current),
        AlertAction::Dismiss => report("dismiss", client.dismiss_alert(current.id).await?),
        AlertAction::StartAnother => {
            report("start another", client.start_another(current.id).await?)
        }
    }
    Ok(())
}

fn redraw(view: &PopupView) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "\r{}", view)?;
    stdout.flush()
}

/// Live popup: hydrate, then follow pushes until the daemon or the user quits
async fn watch(client: &DaemonClient, audio: AudioCue) -> Result<(), ClientError> {
    let mut events = client.events().await?;
    redraw(&PopupView::from_snapshot(&client.timer_state().await?))?;

    let follow = async {
        while let Some(event) = events.next().await? {
            match event {
                PushEvent::TimerUpdate(snapshot) => redraw(&PopupView::from_snapshot(&snapshot))?,
                PushEvent::SessionComplete(done) => {
                    println!("\nSession of {} min complete!", done.configured_minutes);
                    audio.play_completion().await;
                }
                PushEvent::Alert(alert) => {
                    println!();
                    print_alert(&alert);
                }
                PushEvent::AlertCleared(cleared) => {
                    info!("Alert {} cleared", cleared.id);
                }
            }
        }
        warn!("Daemon closed the event stream");
        Ok::<(), ClientError>(())
    };

    tokio::select! {
        result = follow => result?,
        _ = shutdown_signal() => {}
    }

    println!();
    Ok(())
}
