//! Server initialization for the patient token queue.

use std::sync::Arc;

use actors::{ChannelBroadcaster, ensure_supervisor};
use db::repositories::DepartmentRepository;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Initialize storage and actors and build the handler state.
///
/// This should be called once at server startup before handling requests.
pub async fn init_queue(config: &ServerConfig) -> Result<AppState, ApiError> {
    tracing::info!("Initializing patient token queue...");

    db::init(config.db.clone()).await?;

    if !config.departments.is_empty() {
        DepartmentRepository::seed(&config.departments).await?;
    }

    ensure_supervisor().await?;

    let broadcaster = Arc::new(ChannelBroadcaster::new(config.broadcast_capacity));
    let state = AppState::new(broadcaster).with_public_url(config.public_url.clone());

    tracing::info!("Patient token queue initialized");
    Ok(state)
}
