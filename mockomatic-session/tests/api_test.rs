mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;
use uuid::Uuid;

use mockomatic_session::api::{HttpSessionApi, SessionApi, SessionStatus};
use mockomatic_session::config::MockomaticConfig;
use mockomatic_session::error::DraftError;
use mockomatic_session::state::clock::ClockTime;
use mockomatic_session::state::interval::Interval;
use mockomatic_session::store::DraftStore;

use common::{api_base, cli, failing_router, router, serve, FakeApi, SESSION_ID};

fn config(base: &str) -> MockomaticConfig {
    MockomaticConfig {
        api_base: base.to_string(),
        auth_token: Some("token-123".to_string()),
        csrf_token: Some("csrf-456".to_string()),
        utc_offset_minutes: Some(60),
        organisation: Some("Medical School".to_string()),
        ..Default::default()
    }
}

fn ready_store(config: &MockomaticConfig) -> DraftStore {
    let mut store = DraftStore::new(config);
    store.set_location("Clinical Skills Centre");
    store.set_scheduled_date(chrono::NaiveDate::from_ymd_opt(2025, 3, 1));
    store.set_intermission_duration(Interval::from_seconds(60));
    store.add_station("History", Some(Interval::from_seconds(300)));
    store.add_station("Examination", Some(Interval::from_seconds(300)));
    store.add_slot().unwrap();
    store.add_slot().unwrap();
    store
}

#[tokio::test]
async fn test_templates_fetched_with_auth_headers() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let config = config(&api_base(addr));
    let api = HttpSessionApi::from_config(&config);

    let mut store = DraftStore::new(&config);
    assert_eq!(store.fetch_templates(&api).await.unwrap(), 1);
    assert_eq!(store.templates()[0].name, "Finals OSCE");

    let recorded = fake.recorded.lock().unwrap();
    assert_eq!(recorded.auth_headers[0].as_deref(), Some("Bearer token-123"));
    assert_eq!(recorded.csrf_headers[0].as_deref(), Some("csrf-456"));
}

#[tokio::test]
async fn test_apply_fetched_template_orders_stations() {
    let addr = serve(router(FakeApi::default())).await;
    let config = config(&api_base(addr));
    let api = HttpSessionApi::from_config(&config);

    let mut store = ready_store(&config);
    store.fetch_templates(&api).await.unwrap();
    store.apply_template_by("Finals OSCE").unwrap();

    let draft = store.draft();
    assert_eq!(draft.stations[0].title, "History");
    assert_eq!(draft.stations[1].index, 1);
    assert!(draft.session.feedback);
    // 2 * (8:00 + 1:00 + 1:00)
    let run = draft.slots[0].runs[0];
    assert_eq!(run.scheduled_end, ClockTime::from_hm(8, 20));
    assert_eq!(draft.slots[1].runs[0].scheduled_start, ClockTime::from_hm(8, 20));
}

#[tokio::test]
async fn test_failed_template_fetch_is_marked_fetched() {
    let addr = serve(failing_router()).await;
    let api = HttpSessionApi::new(&api_base(addr));
    let mut store = DraftStore::new(&MockomaticConfig::default());

    let err = store.fetch_templates(&api).await.unwrap_err();
    match err {
        DraftError::Api(message) => assert!(message.contains("database unavailable")),
        other => panic!("expected api error, got {:?}", other),
    }
    assert!(store.fetched_templates());
    assert!(store.templates().is_empty());
}

#[tokio::test]
async fn test_push_sends_absolute_timestamps() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let config = config(&api_base(addr));
    let api = HttpSessionApi::from_config(&config);

    let mut store = ready_store(&config);
    let record = store.push(&api).await.unwrap();
    assert_eq!(record.id.to_string(), SESSION_ID);
    assert!(!store.is_dirty());

    let recorded = fake.recorded.lock().unwrap();
    let body = &recorded.created_sessions[0];
    assert_eq!(body["session"]["location"], "Clinical Skills Centre");
    assert_eq!(body["session"]["organisation"], "Medical School");
    assert!(body["session"].get("feedback_duration").is_none());
    assert_eq!(body["stations"].as_array().unwrap().len(), 2);
    assert_eq!(body["slots"][0]["slot_time"], "AM");
    assert_eq!(body["slots"][0]["circuits"][0]["key"], "A");
    assert_eq!(
        body["slots"][0]["runs"][0]["scheduled_start"],
        "2025-03-01T08:00:00+01:00"
    );
    assert_eq!(
        body["slots"][1]["runs"][0]["scheduled_start"],
        "2025-03-01T08:12:00+01:00"
    );
}

#[tokio::test]
async fn test_push_failure_keeps_draft() {
    let addr = serve(failing_router()).await;
    let config = config(&api_base(addr));
    let api = HttpSessionApi::from_config(&config);

    let mut store = ready_store(&config);
    let before = store.draft().clone();
    assert!(matches!(store.push(&api).await, Err(DraftError::Api(_))));
    assert_eq!(store.draft(), &before);
    assert!(store.is_dirty());
}

#[tokio::test]
async fn test_load_session_assembles_draft() {
    let addr = serve(router(FakeApi::default())).await;
    let mut config = config(&api_base(addr));
    config.utc_offset_minutes = Some(0);
    let api = HttpSessionApi::from_config(&config);

    let mut store = ready_store(&config);
    store
        .load_session(&api, Uuid::parse_str(SESSION_ID).unwrap())
        .await
        .unwrap();
    assert!(!store.is_dirty());

    let draft = store.draft();
    let titles: Vec<_> = draft.stations.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["History", "Examination"]);
    assert_eq!(draft.slots.len(), 2);
    assert_eq!(draft.slots[0].key, "A");
    assert_eq!(draft.slots[0].runs.len(), 2);
    assert!(draft.slots[0].runs[0].flip_allocation);
    assert_eq!(draft.slots[0].runs[1].scheduled_start, ClockTime::from_hm(8, 12));
    assert!(draft.slots[0].circuits[1].female_only);
    assert_eq!(draft.slots[1].runs[0].scheduled_start, ClockTime::from_hm(13, 0));
}

#[tokio::test]
async fn test_list_sessions_reads_status() {
    let addr = serve(router(FakeApi::default())).await;
    let api = HttpSessionApi::new(&api_base(addr));
    let sessions = api.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, Some(SessionStatus::Ready));
}

#[tokio::test]
async fn test_unknown_session_is_api_error() {
    let addr = serve(router(FakeApi::default())).await;
    let api = HttpSessionApi::new(&api_base(addr));
    assert!(matches!(
        api.get_session(Uuid::nil()).await,
        Err(DraftError::Api(_))
    ));
}

#[tokio::test]
async fn test_delete_sessions_posts_ids() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let api = HttpSessionApi::new(&api_base(addr)).with_auth_token("admin");
    let id = Uuid::parse_str(SESSION_ID).unwrap();

    api.delete_sessions(&[id]).await.unwrap();

    let recorded = fake.recorded.lock().unwrap();
    assert_eq!(recorded.deleted_sessions.len(), 1);
    assert_eq!(recorded.deleted_sessions[0]["ids"][0], SESSION_ID);
}

#[tokio::test]
async fn test_delete_sessions_failure_is_api_error() {
    let addr = serve(failing_router()).await;
    let api = HttpSessionApi::new(&api_base(addr));
    let err = api.delete_sessions(&[Uuid::nil()]).await.unwrap_err();
    assert!(err.to_string().contains("database unavailable"));
}

#[tokio::test]
async fn test_create_template_posts_draft_stations() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let config = config(&api_base(addr));
    let api = HttpSessionApi::from_config(&config);

    let store = ready_store(&config);
    store.create_template(&api, "Spring mocks").await.unwrap();

    let recorded = fake.recorded.lock().unwrap();
    let body = &recorded.created_templates[0];
    assert_eq!(body["template_session"]["name"], "Spring mocks");
    assert_eq!(body["template_session"]["total_stations"], 2);
    assert_eq!(body["template_stations"][1]["title"], "Examination");
}

// The binary blocks its thread, so the server needs its own workers.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_push_and_fetch() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let base = api_base(addr);
    let dir = TempDir::new().unwrap();

    cli(dir.path()).arg("new").assert().success();
    cli(dir.path())
        .args(["settings", "--location", "Hall 3", "--date", "2025-04-02"])
        .assert()
        .success();
    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", &base)
        .args(["templates", "apply", "--template", "finals osce"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 stations"));
    cli(dir.path()).args(["slot", "add"]).assert().success();

    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", &base)
        .arg("push")
        .assert()
        .success()
        .stdout(predicate::str::contains(SESSION_ID));
    {
        let recorded = fake.recorded.lock().unwrap();
        let body = &recorded.created_sessions[0];
        assert_eq!(body["session"]["location"], "Hall 3");
        assert_eq!(body["session"]["organisation"], "Medical School");
        assert_eq!(
            body["slots"][0]["runs"][0]["scheduled_end"],
            "2025-04-02T08:20:00+00:00"
        );
    }

    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", &base)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready"));

    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", &base)
        .args(["fetch", "--id", SESSION_ID])
        .assert()
        .success();
    cli(dir.path())
        .args(["show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clinical Skills Centre"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_sessions_delete() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let dir = TempDir::new().unwrap();

    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", api_base(addr))
        .args(["sessions", "delete", "--id", SESSION_ID])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 session(s)"));
    assert_eq!(fake.recorded.lock().unwrap().deleted_sessions.len(), 1);

    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", api_base(addr))
        .args(["sessions", "delete", "--id", "not-a-uuid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid session id"));
    assert_eq!(fake.recorded.lock().unwrap().deleted_sessions.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_push_without_organisation_is_refused() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let dir = TempDir::new().unwrap();

    cli(dir.path()).arg("new").assert().success();
    cli(dir.path())
        .args(["settings", "--location", "Hall 3", "--date", "2025-04-02"])
        .assert()
        .success();
    cli(dir.path())
        .args(["station", "add", "--title", "History"])
        .assert()
        .success();
    cli(dir.path()).args(["slot", "add"]).assert().success();

    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", api_base(addr))
        .env_remove("MOCKOMATIC_ORGANISATION")
        .arg("push")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("organisation is not configured"));
    assert!(fake.recorded.lock().unwrap().created_sessions.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_push_refuses_invalid_draft() {
    let fake = FakeApi::default();
    let addr = serve(router(fake.clone())).await;
    let dir = TempDir::new().unwrap();

    cli(dir.path()).arg("new").assert().success();
    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", api_base(addr))
        .arg("push")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Draft validation failed"));
    assert!(fake.recorded.lock().unwrap().created_sessions.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_network_failure_is_error() {
    let addr = serve(failing_router()).await;
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .env("MOCKOMATIC_API_BASE", api_base(addr))
        .args(["templates", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("database unavailable"));
}
