use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use release_domain::{
    GenerateOutcome, Release, ReleaseApi, ReleaseError, ReleaseStatus, ScheduleRequest,
    ScheduleSettings,
};
use release_infrastructure::HttpReleaseApi;

/// 桩服务器记录收到的请求
#[derive(Clone, Default)]
struct StubState {
    calls: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl StubState {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn last_body(&self) -> Option<Value> {
        self.bodies.lock().unwrap().last().cloned()
    }
}

#[derive(Deserialize)]
struct PreviewQuery {
    preview: bool,
}

async fn schedule(State(state): State<StubState>, Path(book_id): Path<String>) -> Response {
    state.record(format!("GET schedule {book_id}"));
    if book_id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database is down").into_response();
    }
    Json(json!([
        {
            "id": "r1",
            "releaseTargetId": "A",
            "releaseTargetName": "Telegram",
            "date": "2024-01-02",
            "chapters": 10,
            "status": "EXECUTED",
            "metadata": {"pages": "1-10", "volume": 2}
        },
        {
            "id": "r2",
            "releaseTargetId": "A",
            "date": "2024-01-08",
            "chapters": 5,
            "executed": false,
            "metadata": null
        }
    ]))
    .into_response()
}

fn release_failure(release_id: &str) -> Option<Response> {
    match release_id {
        "gone" => Some(StatusCode::NOT_FOUND.into_response()),
        "bad" => Some(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "chapters must be positive", "detail": "got 0"})),
            )
                .into_response(),
        ),
        "conflict" => Some(
            (
                StatusCode::CONFLICT,
                Json(json!({"message": "release already executed"})),
            )
                .into_response(),
        ),
        _ => None,
    }
}

async fn toggle_executed(State(state): State<StubState>, Path(release_id): Path<String>) -> Response {
    state.record(format!("PATCH executed {release_id}"));
    release_failure(&release_id).unwrap_or_else(|| StatusCode::NO_CONTENT.into_response())
}

async fn execute(State(state): State<StubState>, Path(release_id): Path<String>) -> Response {
    state.record(format!("POST execute {release_id}"));
    release_failure(&release_id).unwrap_or_else(|| StatusCode::ACCEPTED.into_response())
}

async fn update(
    State(state): State<StubState>,
    Path(release_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.record(format!("PUT release {release_id}"));
    state.bodies.lock().unwrap().push(body);
    release_failure(&release_id).unwrap_or_else(|| StatusCode::OK.into_response())
}

async fn remove(State(state): State<StubState>, Path(release_id): Path<String>) -> Response {
    state.record(format!("DELETE release {release_id}"));
    release_failure(&release_id).unwrap_or_else(|| StatusCode::NO_CONTENT.into_response())
}

async fn generate(
    State(state): State<StubState>,
    Path(book_id): Path<String>,
    Query(query): Query<PreviewQuery>,
    Json(body): Json<Value>,
) -> Response {
    state.record(format!("POST generate {book_id} preview={}", query.preview));
    state.bodies.lock().unwrap().push(body);
    if query.preview {
        Json(json!([
            {"releaseTargetId": "A", "date": "2024-02-01", "chapters": 40},
            {"releaseTargetId": "A", "date": "2024-02-05", "chapters": 60}
        ]))
        .into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

async fn target_releases(State(state): State<StubState>, Path(target_id): Path<String>) -> Response {
    state.record(format!("GET target releases {target_id}"));
    if target_id == "gone" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!([
        {"id": "t1", "releaseTargetId": target_id, "date": "2024-03-01", "chapters": 3, "executed": true}
    ]))
    .into_response()
}

async fn toggle_target(State(state): State<StubState>, Path(target_id): Path<String>) -> Response {
    state.record(format!("PATCH enabled {target_id}"));
    if target_id == "gone" {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn action_types(State(state): State<StubState>) -> Response {
    state.record("GET action-types".to_string());
    Json(json!(["TELEGRAM", "WEBSITE"])).into_response()
}

async fn start_stub() -> (HttpReleaseApi, StubState) {
    let state = StubState::default();
    let app = Router::new()
        .route("/api/books/{id}/schedule", get(schedule))
        .route("/api/books/{id}/generate-release", post(generate))
        .route("/api/releases/{id}/executed", patch(toggle_executed))
        .route("/api/releases/{id}/execute", post(execute))
        .route("/api/releases/{id}", put(update).delete(remove))
        .route("/api/release-targets/{id}/releases", get(target_releases))
        .route("/api/release-targets/{id}/enabled", patch(toggle_target))
        .route("/api/action-types", get(action_types))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (HttpReleaseApi::new(format!("http://{addr}/api/")), state)
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_fetch_schedule_normalizes_status() {
    let (api, state) = start_stub().await;

    let releases = api.fetch_schedule("book-1").await.unwrap();
    assert_eq!(releases.len(), 2);

    let r1 = &releases[0];
    assert!(r1.is_executed());
    assert_eq!(r1.status, ReleaseStatus::Executed);
    assert_eq!(r1.target_name.as_deref(), Some("Telegram"));
    assert_eq!(r1.metadata_value("pages"), Some("1-10"));
    assert_eq!(r1.metadata_value("volume"), Some("2"));

    let r2 = &releases[1];
    assert!(r2.is_pending());
    assert!(r2.metadata.is_empty());
    assert_eq!(state.calls(), vec!["GET schedule book-1"]);
}

#[tokio::test]
async fn test_server_error_maps_to_network() {
    let (api, _state) = start_stub().await;

    let err = api.fetch_schedule("broken").await.unwrap_err();
    match err {
        ReleaseError::Network(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("database is down"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_release_errors_are_mapped() {
    let (api, state) = start_stub().await;

    api.toggle_executed("r1").await.unwrap();

    let err = api.toggle_executed("gone").await.unwrap_err();
    assert!(matches!(err, ReleaseError::ReleaseNotFound { ref id } if id == "gone"));

    let err = api.execute_release("bad").await.unwrap_err();
    assert!(matches!(err, ReleaseError::Validation(ref m) if m == "chapters must be positive: got 0"));

    let err = api.delete_release("conflict").await.unwrap_err();
    assert_eq!(err.user_message(), "release already executed");

    assert_eq!(
        state.calls(),
        vec![
            "PATCH executed r1",
            "PATCH executed gone",
            "POST execute bad",
            "DELETE release conflict",
        ]
    );
}

#[tokio::test]
async fn test_update_release_sends_full_record() {
    let (api, state) = start_stub().await;

    let mut release = Release::new(Some("A".to_string()), day("2024-01-20"), 7);
    release.id = Some("r2".to_string());
    release.metadata.insert("pages".to_string(), "11-17".to_string());
    api.update_release(&release).await.unwrap();

    let body = state.last_body().unwrap();
    assert_eq!(body["id"], "r2");
    assert_eq!(body["releaseTargetId"], "A");
    assert_eq!(body["date"], "2024-01-20");
    assert_eq!(body["chapters"], 7);
    assert_eq!(body["metadata"]["pages"], "11-17");
    assert!(body.get("ui").is_none());

    // 没有id的记录不发请求
    let unsaved = Release::new(None, day("2024-01-20"), 7);
    assert!(matches!(
        api.update_release(&unsaved).await,
        Err(ReleaseError::Validation(_))
    ));
    assert_eq!(state.calls().len(), 1);
}

#[tokio::test]
async fn test_generate_release_preview_and_commit() {
    let (api, state) = start_stub().await;

    let mut settings = ScheduleSettings::new("spring", "TELEGRAM", day("2024-02-01"));
    settings.amount_of_chapters = 100;
    let request = ScheduleRequest {
        settings,
        releases: vec![Release::new(Some("A".to_string()), day("2024-02-01"), 100)],
    };

    let outcome = api.generate_release("book-1", &request, true).await.unwrap();
    match outcome {
        GenerateOutcome::Simulated(releases) => {
            assert_eq!(releases.len(), 2);
            assert_eq!(releases[1].chapters, 60);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let body = state.last_body().unwrap();
    assert_eq!(body["settings"]["name"], "spring");
    assert_eq!(body["settings"]["amountOfChapters"], 100);
    assert_eq!(body["releases"][0]["chapters"], 100);

    let outcome = api.generate_release("book-1", &request, false).await.unwrap();
    assert_eq!(outcome, GenerateOutcome::Committed);
    assert_eq!(
        state.calls(),
        vec![
            "POST generate book-1 preview=true",
            "POST generate book-1 preview=false",
        ]
    );
}

#[tokio::test]
async fn test_target_endpoints() {
    let (api, _state) = start_stub().await;

    let releases = api.fetch_target_releases("B").await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].target_id.as_deref(), Some("B"));
    assert_eq!(releases[0].status, ReleaseStatus::Executed);

    let err = api.fetch_target_releases("gone").await.unwrap_err();
    assert!(matches!(err, ReleaseError::TargetNotFound { ref id } if id == "gone"));

    api.toggle_target_enabled("B").await.unwrap();
    let err = api.toggle_target_enabled("gone").await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(
        api.fetch_action_types().await.unwrap(),
        vec!["TELEGRAM".to_string(), "WEBSITE".to_string()]
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpReleaseApi::new(format!("http://{addr}/api"));
    let err = api.fetch_action_types().await.unwrap_err();
    assert!(err.is_retryable());
}
