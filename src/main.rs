//! Pomodoro Keeper - A state-managed Pomodoro timer daemon
//!
//! This is the main entry point: it either runs the daemon or acts as one
//! of its short-lived clients.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use pomodoro_keeper::{
    api::create_router,
    client,
    config::{Commands, Config, ServeArgs},
    services::{DesktopNotifier, DisabledNotifier, JsonFileStore, MemoryStore, Notifier, SettingsStore},
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so client output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_keeper={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    match config.command.clone() {
        None => serve(&config, ServeArgs::default()).await,
        Some(Commands::Serve(args)) => serve(&config, args).await,
        Some(command) => Ok(client::run(&config, command).await?),
    }
}

async fn serve(config: &Config, args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting pomodoro-keeper v{}", env!("CARGO_PKG_VERSION"));

    let settings: Arc<dyn SettingsStore> = if args.ephemeral {
        info!("Settings kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        let path = args.settings.unwrap_or_else(JsonFileStore::default_path);
        let store = JsonFileStore::open(&path)
            .with_context(|| format!("opening settings at {}", path.display()))?;
        info!("Settings file: {}", store.path().display());
        Arc::new(store)
    };

    let notifier: Arc<dyn Notifier> = if args.no_notify {
        Arc::new(DisabledNotifier)
    } else {
        Arc::new(DesktopNotifier::new())
    };

    // Create application state
    let state = Arc::new(AppState::new(config.port, config.host.clone(), settings, notifier));
    let initial = state.get_timer_state().map_err(anyhow::Error::msg)?;
    info!("Configuration: host={}, port={}, session={}s",
          config.host, config.port, initial.configured_seconds);

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /message                  - Tagged command ({{\"action\": ...}})");
    info!("  GET  /state                    - Current timer");
    info!("  POST /start | /pause | /reset  - Timer commands");
    info!("  POST /minutes                  - Change session length");
    info!("  GET  /events                   - Server-sent updates");
    info!("  GET  /alert                    - Completion alert on display");
    info!("  POST /alert/:id/start-another  - Alert action");
    info!("  POST /alert/:id/dismiss        - Close alert");
    info!("  GET  /status | /health         - Diagnostics");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
