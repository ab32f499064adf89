//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "pomodoro-keeper")]
#[command(about = "A state-managed Pomodoro timer daemon with terminal clients")]
#[command(version)]
pub struct Config {
    /// Port the daemon listens on (and clients connect to)
    #[arg(short, long, global = true, default_value = "20525")]
    pub port: u16,

    /// Host address of the daemon
    #[arg(long, global = true, default_value = "127.0.0.1")]
    pub host: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do; runs the daemon when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the timer daemon
    Serve(ServeArgs),
    /// Print the current timer once
    Status,
    /// Start or resume the countdown
    Start {
        /// New session length in minutes
        #[arg(short, long)]
        minutes: Option<String>,
    },
    /// Pause the countdown
    Pause,
    /// Stop and reload the full session
    Reset {
        /// New session length in minutes
        #[arg(short, long)]
        minutes: Option<String>,
    },
    /// Change the session length
    Minutes {
        /// Session length in minutes
        minutes: String,
    },
    /// Show the timer live, following daemon updates
    Watch {
        /// Do not ring the terminal bell when a session ends
        #[arg(long)]
        no_sound: bool,
    },
    /// Act on the completion alert
    Alert {
        #[command(subcommand)]
        action: AlertAction,
    },
    /// Self-contained countdown that does not talk to the daemon
    Overlay {
        /// Session length in minutes
        #[arg(short, long, default_value = "25")]
        minutes: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AlertAction {
    /// Print the alert on display, if any
    Show,
    /// Close the alert
    Dismiss,
    /// Close the alert and start another session
    StartAnother,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Keep settings in memory only
    #[arg(long, conflicts_with = "settings")]
    pub ephemeral: bool,

    /// Do not mirror completion alerts as desktop notifications
    #[arg(long)]
    pub no_notify: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to reach the daemon
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve_with_defaults() {
        let config = Config::try_parse_from(["pomodoro-keeper"]).unwrap();
        assert!(config.command.is_none());
        assert_eq!(config.address(), "127.0.0.1:20525");
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let config =
            Config::try_parse_from(["pomodoro-keeper", "start", "-m", "10", "--port", "9000", "-v"])
                .unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.verbose);
        match config.command {
            Some(Commands::Start { minutes }) => assert_eq!(minutes.as_deref(), Some("10")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn ephemeral_conflicts_with_settings_path() {
        let result = Config::try_parse_from([
            "pomodoro-keeper",
            "serve",
            "--ephemeral",
            "--settings",
            "/tmp/x.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn overlay_accepts_unparseable_minutes() {
        let config = Config::try_parse_from(["pomodoro-keeper", "overlay", "-m", "abc"]).unwrap();
        match config.command {
            Some(Commands::Overlay { minutes }) => assert_eq!(minutes, "abc"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn alert_actions_parse() {
        let config = Config::try_parse_from(["pomodoro-keeper", "alert", "start-another"]).unwrap();
        assert!(matches!(
            config.command,
            Some(Commands::Alert {
                action: AlertAction::StartAnother
            })
        ));
    }
}
