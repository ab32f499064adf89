//! End-to-end: a real server on an ephemeral port driven through `DaemonClient`

use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, time::timeout};

use pomodoro_keeper::{
    client::DaemonClient,
    create_router,
    protocol::{Command, PushEvent},
    services::{DisabledNotifier, JsonFileStore, MemoryStore, SettingsStore},
    state::TimerMachine,
    AppState,
};

async fn spawn_daemon(state: Arc<AppState>) -> DaemonClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    DaemonClient::new(format!("http://{}", addr)).unwrap()
}

#[tokio::test]
async fn commands_round_trip_through_http() {
    let state = Arc::new(AppState::new(
        0,
        "127.0.0.1".to_string(),
        Arc::new(MemoryStore::new()),
        Arc::new(DisabledNotifier),
    ));
    let client = spawn_daemon(state).await;

    let snapshot = client.timer_state().await.unwrap();
    assert_eq!(snapshot.remaining_seconds, 1500);
    assert!(!snapshot.running);

    assert!(client.command(&Command::UpdateMinutes { minutes: Some(10) }).await.unwrap().success);
    assert_eq!(client.timer_state().await.unwrap().remaining_seconds, 600);

    assert!(client.command(&Command::StartTimer { minutes: None }).await.unwrap().success);
    assert!(client.timer_state().await.unwrap().running);

    assert!(client.command(&Command::PauseTimer).await.unwrap().success);
    assert!(!client.timer_state().await.unwrap().running);

    assert!(client.command(&Command::ResetTimer { minutes: None }).await.unwrap().success);
    assert_eq!(client.timer_state().await.unwrap().remaining_seconds, 600);
    assert!(client.alert().await.unwrap().is_none());
}

#[tokio::test]
async fn watcher_receives_updates_and_completion() {
    let state = Arc::new(AppState::with_machine(
        0,
        "127.0.0.1".to_string(),
        TimerMachine::with_configured_seconds(1),
        Arc::new(MemoryStore::new()),
        Arc::new(DisabledNotifier),
    ));
    let client = spawn_daemon(state).await;

    let mut events = client.events().await.unwrap();
    let first = timeout(Duration::from_secs(5), events.next()).await.unwrap().unwrap();
    assert!(matches!(first, Some(PushEvent::TimerUpdate(s)) if !s.running));

    client.command(&Command::StartTimer { minutes: None }).await.unwrap();

    let mut saw_complete = false;
    let mut alert_id = None;
    while alert_id.is_none() {
        let event = timeout(Duration::from_secs(5), events.next())
            .await
            .expect("event before timeout")
            .unwrap()
            .expect("stream open");
        match event {
            PushEvent::SessionComplete(done) => {
                assert_eq!(done.configured_minutes, 1);
                saw_complete = true;
            }
            PushEvent::Alert(alert) => alert_id = Some(alert.id),
            _ => {}
        }
    }
    assert!(saw_complete);

    let after = client.timer_state().await.unwrap();
    assert_eq!(after.remaining_seconds, 1);
    assert!(!after.running);

    let id = alert_id.unwrap();
    assert!(client.dismiss_alert(id).await.unwrap().success);
    assert!(!client.start_another(id).await.unwrap().success);
}

#[tokio::test]
async fn configured_minutes_survive_daemon_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::open(&path).unwrap());
    let state = Arc::new(AppState::new(0, "127.0.0.1".into(), store, Arc::new(DisabledNotifier)));
    let client = spawn_daemon(state).await;
    client.command(&Command::UpdateMinutes { minutes: Some(10) }).await.unwrap();

    let reopened: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::open(&path).unwrap());
    let restarted = AppState::new(0, "127.0.0.1".into(), reopened, Arc::new(DisabledNotifier));
    let snapshot = restarted.get_timer_state().unwrap();
    assert_eq!(snapshot.configured_seconds, 600);
    assert_eq!(snapshot.remaining_seconds, 600);
}

#[tokio::test]
async fn unreachable_daemon_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = DaemonClient::new(format!("http://{}", addr)).unwrap();
    let err = client.timer_state().await.unwrap_err();
    assert!(err.to_string().contains("Cannot reach the daemon"));
}
