//! Polling tests against a mock Grocy server: API client, controller cycles,
//! and the event loop.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chorewatch::config::{Config, ConfigError, ConfigSource, FileConfigSource, StaticConfig};
use chorewatch::grocy::{GrocyClient, GrocyError};
use chorewatch::notify::{PresentError, Presenter};
use chorewatch::scheduler::{run_event_loop, AutoCheck, Command, EngineState, PollController};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ───────────────────────────────────────────────────────

const PAST: &str = "2020-01-01 08:00:00";
const FUTURE: &str = "2099-01-01 08:00:00";

fn chore(id: i64, name: &str, user_id: i64, username: &str, next: &str) -> Value {
    json!({
        "chore_id": id,
        "chore_name": name,
        "last_tracked_time": null,
        "track_date_only": 0,
        "next_estimated_execution_time": next,
        "next_execution_assigned_to_user_id": user_id,
        "is_rescheduled": 0,
        "is_reassigned": 1,
        "next_execution_assigned_user": {
            "id": user_id,
            "username": username,
            "first_name": null,
            "last_name": null,
            "display_name": username,
            "picture_file_name": null,
            "row_created_timestamp": "2024-01-01 00:00:00"
        }
    })
}

async fn serve_chores(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/chores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> Config {
    Config {
        grocy_url: format!("{}/api", server.uri()),
        api_key: "secret".to_string(),
        username: "alice".to_string(),
        check_timeout_minutes: 1,
    }
}

#[derive(Default)]
struct RecordingPresenter {
    notifications: Mutex<Vec<(String, String)>>,
    icons: Mutex<Vec<bool>>,
    urls: Mutex<Vec<String>>,
    paths: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().unwrap().clone()
    }

    fn icons(&self) -> Vec<bool> {
        self.icons.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Presenter for RecordingPresenter {
    async fn notify(&self, title: &str, message: &str) -> Result<(), PresentError> {
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        Ok(())
    }

    fn set_icon(&self, warning: bool) {
        self.icons.lock().unwrap().push(warning);
    }

    async fn open_url(&self, url: &str) -> Result<(), PresentError> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn open_path(&self, path: &Path) -> Result<(), PresentError> {
        self.paths.lock().unwrap().push(path.display().to_string());
        Ok(())
    }
}

struct BrokenConfig;

impl ConfigSource for BrokenConfig {
    fn load(&self) -> Result<Config, ConfigError> {
        Err(ConfigError::NoConfigDir)
    }
}

/// Config whose interval can be changed mid-test; records when it is read.
struct ChangingConfig {
    minutes: Mutex<i64>,
    loads: Mutex<Vec<tokio::time::Instant>>,
}

impl ChangingConfig {
    fn new(minutes: i64) -> Self {
        Self {
            minutes: Mutex::new(minutes),
            loads: Mutex::new(Vec::new()),
        }
    }

    fn set_minutes(&self, minutes: i64) {
        *self.minutes.lock().unwrap() = minutes;
    }
}

impl ConfigSource for ChangingConfig {
    fn load(&self) -> Result<Config, ConfigError> {
        self.loads.lock().unwrap().push(tokio::time::Instant::now());
        Ok(Config {
            // Fails before any request is sent.
            grocy_url: "not a url".to_string(),
            check_timeout_minutes: *self.minutes.lock().unwrap(),
            ..Config::default()
        })
    }
}

fn controller_for(server: &MockServer) -> (PollController, Arc<RecordingPresenter>) {
    let presenter = Arc::new(RecordingPresenter::default());
    let controller = PollController::new(
        Arc::new(StaticConfig(config_for(server))),
        presenter.clone(),
    );
    (controller, presenter)
}

async fn wait_for_notifications(presenter: &RecordingPresenter, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while presenter.notifications().len() < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {n} notifications"));
}

// ── API client ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_chores_sends_api_key_and_accept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chores"))
        .and(header("GROCY-API-KEY", "secret"))
        .and(header("Accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([chore(1, "Dishes", 2, "alice", PAST)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = GrocyClient::new(&format!("{}/api", server.uri()), "secret").unwrap();
    let chores = client.fetch_chores().await.unwrap();

    assert_eq!(chores.len(), 1);
    assert_eq!(chores[0].chore_name, "Dishes");
    assert!(chores[0].is_reassigned);
    assert!(!chores[0].is_rescheduled);
    assert_eq!(chores[0].assigned_username(), Some("alice"));
}

#[tokio::test]
async fn test_fetch_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(header("GROCY-API-KEY", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "username": "admin",
                "first_name": null,
                "last_name": null,
                "display_name": "admin",
                "picture_file_name": null,
                "row_created_timestamp": "2024-01-01 00:00:00"
            },
            {
                "id": 2,
                "username": "alice",
                "first_name": "Alice",
                "last_name": "Liddell",
                "display_name": "Alice Liddell",
                "picture_file_name": "alice.jpg",
                "row_created_timestamp": "2024-02-01 00:00:00"
            }
        ])))
        .mount(&server)
        .await;

    let client = GrocyClient::new(&format!("{}/api/", server.uri()), "secret").unwrap();
    let users = client.fetch_users().await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[1].username, "alice");
    assert_eq!(users[1].label(), "Alice Liddell");
    assert_eq!(users[1].picture_file_name.as_deref(), Some("alice.jpg"));
}

#[tokio::test]
async fn test_non_200_is_http_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chores"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let client = GrocyClient::new(&format!("{}/api", server.uri()), "wrong").unwrap();
    let err = client.fetch_chores().await.unwrap_err();
    match err {
        GrocyError::HttpStatus { resource, status } => {
            assert_eq!(resource, "chores");
            assert_eq!(status.as_u16(), 401);
        }
        other => panic!("expected HttpStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chores"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let client = GrocyClient::new(&format!("{}/api", server.uri()), "secret").unwrap();
    let err = client.fetch_chores().await.unwrap_err();
    assert!(matches!(err, GrocyError::Decode { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_non_integer_flag_is_decode_error() {
    let server = MockServer::start().await;
    let mut bad = chore(1, "Dishes", 2, "alice", PAST);
    bad["is_rescheduled"] = json!("yes");
    serve_chores(&server, json!([bad])).await;

    let client = GrocyClient::new(&format!("{}/api", server.uri()), "secret").unwrap();
    let err = client.fetch_chores().await.unwrap_err();
    assert!(matches!(err, GrocyError::Decode { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = GrocyClient::new("http://127.0.0.1:1/api", "secret").unwrap();
    let err = client.fetch_chores().await.unwrap_err();
    assert!(matches!(err, GrocyError::Transport { .. }), "got: {err:?}");
}

// ── Controller ────────────────────────────────────────────────────

#[tokio::test]
async fn test_cycle_notifies_overdue_chores() {
    let server = MockServer::start().await;
    serve_chores(
        &server,
        json!([
            chore(1, "Dishes", 2, "alice", PAST),
            chore(2, "Laundry", 3, "bob", PAST),
            chore(3, "Plants", 2, "alice", FUTURE),
            chore(4, "Vacuum", 2, "alice", ""),
        ]),
    )
    .await;
    let (controller, presenter) = controller_for(&server);

    let outcome = controller.check_and_notify().await;

    assert!(outcome.completed);
    assert_eq!(outcome.overdue_names, vec!["Dishes"]);
    assert_eq!(outcome.overdue_count, 1);
    assert_eq!(outcome.user_id_for_link, Some(2));
    assert_eq!(
        controller.state(),
        EngineState {
            has_overdue: true,
            last_user_id: Some(2),
        }
    );
    assert_eq!(presenter.icons(), vec![true]);

    let notes = presenter.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, "Chorewatch");
    assert!(notes[0].1.starts_with("You have 1 overdue chores!"));
    assert!(notes[0].1.contains("- Dishes"));
}

#[tokio::test]
async fn test_cycle_caps_listed_chores() {
    let server = MockServer::start().await;
    let chores: Vec<Value> = (1..=5)
        .map(|i| chore(i, &format!("Chore {i}"), 2, "alice", PAST))
        .collect();
    serve_chores(&server, Value::Array(chores)).await;
    let (controller, presenter) = controller_for(&server);

    let outcome = controller.check_and_notify().await;
    assert_eq!(outcome.overdue_count, 5);

    let message = &presenter.notifications()[0].1;
    assert!(message.contains("- Chore 1"));
    assert!(message.contains("- Chore 3"));
    assert!(!message.contains("Chore 4"));
    assert!(message.lines().any(|l| l == "...and 2 more"));
}

#[tokio::test]
async fn test_nothing_overdue_clears_icon_without_notification() {
    let server = MockServer::start().await;
    serve_chores(&server, json!([chore(1, "Plants", 2, "alice", FUTURE)])).await;
    let (controller, presenter) = controller_for(&server);

    let outcome = controller.check_and_notify().await;

    assert!(outcome.completed);
    assert!(!outcome.has_overdue());
    assert!(!controller.state().has_overdue);
    assert_eq!(presenter.icons(), vec![false]);
    assert!(presenter.notifications().is_empty());
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_state() {
    let server = MockServer::start().await;
    serve_chores(&server, json!([chore(1, "Dishes", 2, "alice", PAST)])).await;
    let (controller, presenter) = controller_for(&server);

    controller.check_and_notify().await;
    let before = controller.state();
    assert!(before.has_overdue);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/chores"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = controller.check_and_notify().await;

    assert!(!outcome.completed);
    assert!(outcome.overdue_names.is_empty());
    assert_eq!(controller.state(), before);
    assert_eq!(presenter.notifications().len(), 1);
    assert_eq!(presenter.icons(), vec![true]);
}

#[tokio::test]
async fn test_config_failure_skips_cycle() {
    let presenter = Arc::new(RecordingPresenter::default());
    let controller = PollController::new(Arc::new(BrokenConfig), presenter.clone());

    let outcome = controller.check_and_notify().await;

    assert!(!outcome.completed);
    assert_eq!(controller.state(), EngineState::default());
    assert!(presenter.icons().is_empty());
}

#[tokio::test]
async fn test_web_link_uses_last_matching_user() {
    let server = MockServer::start().await;
    serve_chores(
        &server,
        json!([
            chore(1, "Dishes", 2, "alice", PAST),
            chore(2, "Laundry", 7, "alice", FUTURE),
            chore(3, "Trash", 9, "bob", PAST),
        ]),
    )
    .await;
    let (controller, _presenter) = controller_for(&server);

    assert_eq!(
        controller.web_link().await.unwrap(),
        format!("{}/choresoverview", server.uri())
    );

    controller.run_cycle().await;

    assert_eq!(
        controller.web_link().await.unwrap(),
        format!("{}/choresoverview?user=7", server.uri())
    );
}

#[tokio::test]
async fn test_recreated_config_is_announced_on_every_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let presenter = Arc::new(RecordingPresenter::default());
    let controller = PollController::new(
        Arc::new(FileConfigSource::new(&path)),
        presenter.clone(),
    );

    controller.load_config().await.unwrap();
    controller.load_config().await.unwrap();
    assert_eq!(presenter.notifications().len(), 1);

    std::fs::remove_file(&path).unwrap();
    let config = controller.load_config().await.unwrap();

    assert_eq!(config, Config::default());
    assert!(path.exists());
    let notifications = presenter.notifications();
    assert_eq!(notifications.len(), 2);
    assert!(notifications.iter().all(|(title, _)| title == "No Config"));
    let dir_name = dir.path().display().to_string();
    assert_eq!(
        presenter.paths.lock().unwrap().clone(),
        vec![dir_name.clone(), dir_name]
    );
}

// ── Event loop ────────────────────────────────────────────────────

#[tokio::test]
async fn test_event_loop_initial_and_manual_checks() {
    let server = MockServer::start().await;
    serve_chores(&server, json!([chore(1, "Dishes", 2, "alice", PAST)])).await;
    let (controller, presenter) = controller_for(&server);

    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(run_event_loop(controller, rx));

    wait_for_notifications(&presenter, 1).await;
    tx.send(Command::CheckNow).await.unwrap();
    wait_for_notifications(&presenter, 2).await;
    tx.send(Command::Quit).await.unwrap();

    let state = handle.await.unwrap();
    assert_eq!(state, AutoCheck::Enabled);
    assert_eq!(presenter.notifications().len(), 2);
}

#[tokio::test]
async fn test_event_loop_toggle_and_open_web() {
    let server = MockServer::start().await;
    serve_chores(&server, json!([chore(1, "Dishes", 4, "alice", PAST)])).await;
    let (controller, presenter) = controller_for(&server);

    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(run_event_loop(controller, rx));

    wait_for_notifications(&presenter, 1).await;
    tx.send(Command::ToggleAutoCheck).await.unwrap();
    tx.send(Command::OpenWeb).await.unwrap();
    tx.send(Command::OpenSettings).await.unwrap();
    tx.send(Command::Quit).await.unwrap();

    let state = handle.await.unwrap();
    assert_eq!(state, AutoCheck::Disabled);
    assert_eq!(
        presenter.urls.lock().unwrap().clone(),
        vec![format!("{}/choresoverview?user=4", server.uri())]
    );
    // StaticConfig has no file to open.
    assert!(presenter.paths.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_event_loop_exits_when_commands_close() {
    let server = MockServer::start().await;
    serve_chores(&server, json!([])).await;
    let (controller, presenter) = controller_for(&server);

    let (tx, rx) = mpsc::channel(8);
    drop(tx);

    let state = run_event_loop(controller, rx).await;
    assert_eq!(state, AutoCheck::Enabled);
    assert!(presenter.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_event_loop_follows_interval_changes() {
    let config = Arc::new(ChangingConfig::new(1));
    let presenter = Arc::new(RecordingPresenter::default());
    let controller = PollController::new(config.clone(), presenter.clone());
    let start = tokio::time::Instant::now();

    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(run_event_loop(controller, rx));
    while config.loads.lock().unwrap().is_empty() {
        tokio::task::yield_now().await;
    }

    // Toggling back on picks up the interval edited while off.
    tx.send(Command::ToggleAutoCheck).await.unwrap();
    config.set_minutes(5);
    tx.send(Command::ToggleAutoCheck).await.unwrap();

    // Each tick re-reads the config and restarts the countdown with it.
    tokio::time::sleep_until(start + Duration::from_secs(299)).await;
    config.set_minutes(2);
    tokio::time::sleep_until(start + Duration::from_secs(421)).await;

    tx.send(Command::Quit).await.unwrap();
    let state = handle.await.unwrap();
    assert_eq!(state, AutoCheck::Enabled);

    let mut offsets: Vec<u64> = config
        .loads
        .lock()
        .unwrap()
        .iter()
        .map(|t| (*t - start).as_secs())
        .collect();
    offsets.dedup();
    assert_eq!(offsets, vec![0, 300, 420]);
    assert!(presenter.notifications().is_empty());
}
