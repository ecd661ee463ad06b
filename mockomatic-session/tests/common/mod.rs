#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const SESSION_ID: &str = "6f1c1d9e-4a59-4b8e-9d0b-0e7f1c2d3a4b";
pub const AM_SLOT_ID: &str = "11111111-1111-4111-8111-111111111111";
pub const PM_SLOT_ID: &str = "22222222-2222-4222-8222-222222222222";

pub fn mockomatic_session_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mockomatic-session"))
}

/// Command with an isolated draft and config, untouched by the caller's
/// environment.
pub fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(mockomatic_session_bin());
    cmd.arg("--draft")
        .arg(dir.join("draft.json"))
        .arg("--config")
        .arg(dir.join("config.toml"))
        .env_remove("MOCKOMATIC_API_BASE")
        .env_remove("MOCKOMATIC_AUTH_TOKEN")
        .env_remove("MOCKOMATIC_CSRF_TOKEN")
        .env_remove("RUST_LOG")
        .env("MOCKOMATIC_ORGANISATION", "Medical School")
        .env("MOCKOMATIC_UTC_OFFSET", "0");
    cmd
}

/// What the fake API saw.
#[derive(Default)]
pub struct Recorded {
    pub created_sessions: Vec<Value>,
    pub created_templates: Vec<Value>,
    pub deleted_sessions: Vec<Value>,
    pub auth_headers: Vec<Option<String>>,
    pub csrf_headers: Vec<Option<String>>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    pub recorded: Arc<Mutex<Recorded>>,
}

#[derive(Deserialize)]
struct IdQuery {
    id: String,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn interval(seconds: i64) -> Value {
    json!({ "months": 0, "days": 0, "microseconds": seconds * 1_000_000 })
}

pub fn session_json() -> Value {
    json!({
        "id": SESSION_ID,
        "organiser_id": "00000000-0000-0000-0000-000000000000",
        "organisation": "Medical School",
        "scheduled_date": "2025-03-01",
        "location": "Clinical Skills Centre",
        "total_stations": 2,
        "feedback": false,
        "intermission_duration": interval(60),
        "static_at_end": false,
        "status": "ready",
        "created_at": "2025-02-01T09:00:00Z"
    })
}

fn templates_json() -> Value {
    json!([
        {
            "id": "33333333-3333-4333-8333-333333333333",
            "name": "Finals OSCE",
            "feedback": true,
            "feedback_duration": interval(60),
            "intermission_duration": interval(60),
            "static_at_end": false,
            "stations": [
                { "id": "44444444-4444-4444-8444-444444444444",
                  "template_id": "33333333-3333-4333-8333-333333333333",
                  "title": "Examination", "index": 1, "duration": interval(480) },
                { "id": "55555555-5555-4555-8555-555555555555",
                  "template_id": "33333333-3333-4333-8333-333333333333",
                  "title": "History", "index": 0, "duration": interval(480) }
            ]
        }
    ])
}

async fn get_templates(State(api): State<FakeApi>, headers: HeaderMap) -> Json<Value> {
    let mut recorded = api.recorded.lock().unwrap();
    recorded.auth_headers.push(header(&headers, "authorization"));
    recorded.csrf_headers.push(header(&headers, "x-csrf-token"));
    Json(templates_json())
}

async fn create_template(State(api): State<FakeApi>, Json(body): Json<Value>) -> Json<Value> {
    api.recorded.lock().unwrap().created_templates.push(body);
    Json(json!({ "id": "33333333-3333-4333-8333-333333333333" }))
}

async fn create_session(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut recorded = api.recorded.lock().unwrap();
    recorded.auth_headers.push(header(&headers, "authorization"));
    recorded.csrf_headers.push(header(&headers, "x-csrf-token"));
    let mut session = session_json();
    session["location"] = body["session"]["location"].clone();
    session["scheduled_date"] = body["session"]["scheduled_date"].clone();
    recorded.created_sessions.push(body);
    Json(session)
}

async fn delete_sessions(State(api): State<FakeApi>, Json(body): Json<Value>) -> StatusCode {
    api.recorded.lock().unwrap().deleted_sessions.push(body);
    StatusCode::OK
}

async fn list_sessions() -> Json<Value> {
    Json(json!([session_json()]))
}

async fn get_session(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["id"] == SESSION_ID {
        Ok(Json(session_json()))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn get_stations(Query(q): Query<IdQuery>) -> Json<Value> {
    if q.id != SESSION_ID {
        return Json(json!([]));
    }
    Json(json!([
        { "id": "66666666-6666-4666-8666-666666666661", "session_id": SESSION_ID,
          "title": "Examination", "index": 1, "duration": interval(300) },
        { "id": "66666666-6666-4666-8666-666666666662", "session_id": SESSION_ID,
          "title": "History", "index": 0, "duration": interval(300) }
    ]))
}

async fn get_slots(Query(q): Query<IdQuery>) -> Json<Value> {
    if q.id != SESSION_ID {
        return Json(json!([]));
    }
    Json(json!([
        { "id": PM_SLOT_ID, "session_id": SESSION_ID, "slot_time": "PM" },
        { "id": AM_SLOT_ID, "session_id": SESSION_ID, "slot_time": "AM" }
    ]))
}

async fn get_runs(Query(q): Query<IdQuery>) -> Json<Value> {
    let runs = match q.id.as_str() {
        AM_SLOT_ID => json!([
            { "id": "77777777-7777-4777-8777-777777777772", "slot_id": AM_SLOT_ID,
              "flip_allocation": false,
              "scheduled_start": "2025-03-01T08:12:00+00:00",
              "scheduled_end": "2025-03-01T08:24:00+00:00",
              "timer_start": null, "timer_end": null },
            { "id": "77777777-7777-4777-8777-777777777771", "slot_id": AM_SLOT_ID,
              "flip_allocation": true,
              "scheduled_start": "2025-03-01T08:00:00+00:00",
              "scheduled_end": "2025-03-01T08:12:00+00:00",
              "timer_start": null, "timer_end": null }
        ]),
        PM_SLOT_ID => json!([
            { "id": "77777777-7777-4777-8777-777777777773", "slot_id": PM_SLOT_ID,
              "flip_allocation": false,
              "scheduled_start": "2025-03-01T13:00:00+00:00",
              "scheduled_end": "2025-03-01T13:12:00+00:00",
              "timer_start": null, "timer_end": null }
        ]),
        _ => json!([]),
    };
    Json(runs)
}

async fn get_circuits(Query(q): Query<IdQuery>) -> Json<Value> {
    let circuit = |id: &str, key: &str, female_only: bool| {
        json!({ "id": id, "session_id": SESSION_ID, "slot_id": q.id, "key": key,
                "female_only": female_only, "current_rotation": null,
                "status": "waiting", "intermission": false })
    };
    match q.id.as_str() {
        AM_SLOT_ID => Json(json!([
            circuit("88888888-8888-4888-8888-888888888882", "B", true),
            circuit("88888888-8888-4888-8888-888888888881", "A", false)
        ])),
        PM_SLOT_ID => Json(json!([circuit("88888888-8888-4888-8888-888888888883", "A", false)])),
        _ => Json(json!([])),
    }
}

pub fn router(api: FakeApi) -> Router {
    let v1 = Router::new()
        .route("/templates/get-all", get(get_templates))
        .route("/templates/create", post(create_template))
        .route("/sessions/create", post(create_session))
        .route("/sessions/get-all", get(list_sessions))
        .route("/sessions/get", post(get_session))
        .route("/sessions/delete", post(delete_sessions))
        .route("/stations/get-session", get(get_stations))
        .route("/slots/get-session", get(get_slots))
        .route("/runs/get-slot", get(get_runs))
        .route("/circuits/get-slot", get(get_circuits))
        .with_state(api);
    Router::new().nest("/api/v1", v1)
}

/// A server that fails every request.
pub fn failing_router() -> Router {
    Router::new().fallback(|| async {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database unavailable" })),
        )
    })
}

/// Serve `app` on a random local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn api_base(addr: SocketAddr) -> String {
    format!("http://{}/api/v1", addr)
}
