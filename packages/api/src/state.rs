//! Shared handler state.

use std::sync::Arc;

use actors::{ChannelBroadcaster, QueueService};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub service: QueueService<ChannelBroadcaster>,
    /// Base URL for verification links, the request host when unset.
    pub public_url: Option<String>,
}

impl AppState {
    pub fn new(broadcaster: Arc<ChannelBroadcaster>) -> Self {
        Self {
            service: QueueService::new(broadcaster),
            public_url: None,
        }
    }

    pub fn with_public_url(mut self, url: Option<String>) -> Self {
        self.public_url = url;
        self
    }

    /// The display event channel.
    pub fn events(&self) -> &ChannelBroadcaster {
        self.service.broadcaster()
    }
}
