//! In-process fake of the Buildkite API
//!
//! Serves the client's own tests and, behind the `test-util` feature, the
//! launcher's end-to-end tests.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use kernelbot_core::dto::build::CreateBuild;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::BuildkiteClient;

const PIPELINE: &str = "/organizations/acme/pipelines/kernelbot";

struct Inner {
    base: String,
    /// States answered by successive polls; the last one repeats
    states: Vec<&'static str>,
    polls: AtomicUsize,
    created: Mutex<Vec<CreateBuild>>,
    cancels: AtomicUsize,
    store_hits: AtomicUsize,
}

impl Inner {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(format!("Bearer {}", FakeBuildkite::TOKEN).as_str())
    }

    fn build_json(&self, number: u64, state: &str) -> Value {
        json!({
            "id": format!("build-{}", number),
            "number": number,
            "url": format!("{}{}/builds/{}", self.base, PIPELINE, number),
            "web_url": format!("https://buildkite.example/acme/kernelbot/builds/{}", number),
            "state": state,
            "jobs": [
                {"id": "j1", "type": "script", "artifacts_url": format!("{}/jobs/j1/artifacts", self.base)},
                {"type": "waiter"}
            ]
        })
    }
}

pub struct FakeBuildkite {
    inner: Arc<Inner>,
}

impl FakeBuildkite {
    pub const TOKEN: &'static str = "secret";

    pub const RESULT_BODY: &'static str = r#"{"success": true, "error": "", "runs": {"profile": {"start": "2026-03-01T10:00:00Z", "end": "2026-03-01T10:00:09Z", "profile": {"profiler": "ncu", "trace": "summary"}}}, "system": {"gpu": "NVIDIA H100"}}"#;

    /// Starts a server whose builds are always `passed`
    pub async fn start() -> Self {
        Self::start_with_states(&["passed"]).await
    }

    /// Starts a server whose polls answer `states` in order
    pub async fn start_with_states(states: &[&'static str]) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let inner = Arc::new(Inner {
            base,
            states: states.to_vec(),
            polls: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            store_hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route(&format!("{}/builds", PIPELINE), post(create_build))
            .route(&format!("{}/builds/{{number}}", PIPELINE), get(get_build))
            .route(&format!("{}/builds/{{number}}/cancel", PIPELINE), put(cancel_build))
            .route("/organizations/acme/agents", get(list_agents))
            .route("/jobs/{job}/artifacts", get(list_artifacts))
            .route("/download/result", get(redirect_to_store))
            .route("/download/relative", get(redirect_relative))
            .route("/download/no-location", get(redirect_without_location))
            .route("/download/direct", get(direct_download))
            .route("/download/broken", get(broken_download))
            .route("/store/result", get(store_object))
            .with_state(Arc::clone(&inner));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { inner }
    }

    pub fn base(&self) -> &str {
        &self.inner.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base, path)
    }

    pub fn client(&self) -> BuildkiteClient {
        self.client_with_token(Self::TOKEN)
    }

    pub fn client_with_token(&self, token: &str) -> BuildkiteClient {
        BuildkiteClient::new(&self.inner.base, "acme", "kernelbot", token, Duration::from_secs(5)).unwrap()
    }

    pub fn created_builds(&self) -> Vec<CreateBuild> {
        self.inner.created.lock().unwrap().clone()
    }

    pub fn cancel_calls(&self) -> usize {
        self.inner.cancels.load(Ordering::SeqCst)
    }

    pub fn store_hits(&self) -> usize {
        self.inner.store_hits.load(Ordering::SeqCst)
    }
}

async fn create_build(
    State(fake): State<Arc<Inner>>,
    headers: HeaderMap,
    Json(req): Json<CreateBuild>,
) -> Response {
    if !fake.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "bad token").into_response();
    }
    let number = {
        let mut created = fake.created.lock().unwrap();
        created.push(req);
        created.len() as u64
    };
    Json(fake.build_json(number, "scheduled")).into_response()
}

async fn get_build(
    State(fake): State<Arc<Inner>>,
    headers: HeaderMap,
    Path(number): Path<u64>,
) -> Response {
    if !fake.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let poll = fake.polls.fetch_add(1, Ordering::SeqCst);
    let state = fake
        .states
        .get(poll)
        .or(fake.states.last())
        .copied()
        .unwrap_or("passed");
    Json(fake.build_json(number, state)).into_response()
}

async fn cancel_build(
    State(fake): State<Arc<Inner>>,
    headers: HeaderMap,
    Path(number): Path<u64>,
) -> Response {
    if !fake.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if fake.cancels.fetch_add(1, Ordering::SeqCst) > 0 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "Build can't be canceled"})),
        )
            .into_response();
    }
    Json(fake.build_json(number, "canceling")).into_response()
}

async fn list_agents(State(fake): State<Arc<Inner>>, headers: HeaderMap) -> Response {
    if !fake.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        {"name": "l40s-0", "connection_state": "connected", "metadata": ["queue=test", "gpu-index=0"]},
        {"name": "l40s-1", "connection_state": "connected", "metadata": ["queue=test", "gpu-index=1"], "job": {"id": "x"}},
        {"name": "h100-0", "connection_state": "connected", "metadata": ["queue=h100"], "job": null}
    ]))
    .into_response()
}

async fn list_artifacts(State(fake): State<Arc<Inner>>, headers: HeaderMap) -> Response {
    if !fake.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        {
            "id": "a1",
            "job_id": "j1",
            "filename": "result.json",
            "path": "result.json",
            "file_size": 64,
            "download_url": format!("{}/download/result", fake.base)
        },
        {
            "id": "a2",
            "job_id": "j1",
            "filename": "trace.ncu-rep",
            "path": "profile_data/trace.ncu-rep",
            "file_size": 2048,
            "download_url": format!("{}/download/trace", fake.base)
        }
    ]))
    .into_response()
}

async fn redirect_to_store(State(fake): State<Arc<Inner>>, headers: HeaderMap) -> Response {
    if !fake.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let location = format!("{}/store/result?sig=abc", fake.base);
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

async fn redirect_relative() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/store/missing")]).into_response()
}

async fn redirect_without_location() -> Response {
    StatusCode::FOUND.into_response()
}

async fn direct_download() -> &'static str {
    "direct"
}

async fn broken_download() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable").into_response()
}

/// Pre-signed storage object: rejects any foreign Authorization header
async fn store_object(State(fake): State<Arc<Inner>>, headers: HeaderMap) -> Response {
    fake.store_hits.fetch_add(1, Ordering::SeqCst);
    if headers.contains_key(header::AUTHORIZATION) {
        return (StatusCode::FORBIDDEN, "Only one auth mechanism allowed").into_response();
    }
    FakeBuildkite::RESULT_BODY.into_response()
}
