//! HTTP API for the patient token queue.
//!
//! This crate serves:
//! - Operator endpoints (call-next, move-next, announce)
//! - Registration and queue listings
//! - A WebSocket feed of display updates

mod config;
mod error;
mod init;
mod realtime;
pub mod routes;
mod state;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig, parse_departments};
pub use error::{ApiError, ErrorResponse};
pub use init::init_queue;
pub use realtime::{frame, ws_handler};
pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::health))
        .route("/api/call-next", post(routes::call_next))
        .route("/api/move-next", post(routes::move_next))
        .route("/api/current-token", get(routes::current_token))
        .route("/api/announce-current", post(routes::announce_current))
        .route("/api/departments", get(routes::departments))
        .route("/register", post(routes::register))
        .route("/queue/{department_id}", get(routes::department_queue))
        .route("/ws", get(realtime::ws_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
