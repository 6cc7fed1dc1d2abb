#![allow(dead_code)]

use std::future::Future;
use std::sync::{LazyLock, Mutex, PoisonError};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::runtime::Runtime;
use tower::ServiceExt;

use api::{ApiError, ServerConfig, init_queue, parse_departments, router};

/// One runtime for every test so the store and the actors outlive each test.
static RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime")
});

static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Run a test body on the shared runtime, one test at a time.
pub fn run<F: Future>(test: F) -> F::Output {
    let _guard = TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    RUNTIME.block_on(test)
}

/// Fresh store seeded with two departments, and a router over it.
pub async fn setup() -> Result<Router, ApiError> {
    let config = ServerConfig {
        departments: parse_departments("1:General Medicine,2:Cardiology").unwrap_or_default(),
        public_url: Some("http://queue.local/".to_string()),
        ..ServerConfig::default()
    };

    db::init(config.db.clone()).await?;
    db::get_db()?
        .query("REMOVE TABLE IF EXISTS current_token; REMOVE TABLE IF EXISTS patient_tokens; REMOVE TABLE IF EXISTS patients; REMOVE TABLE IF EXISTS specializations;")
        .await
        .map_err(db::DbError::from)?
        .check()
        .map_err(db::DbError::from)?;

    let state = init_queue(&config).await?;
    Ok(router(state))
}

/// Send a request and decode the JSON response.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}
