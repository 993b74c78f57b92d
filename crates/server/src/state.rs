//! Shared server state.

use std::sync::Arc;
use std::time::Instant;

use simulation::Controller;

/// State cloned into each handler via axum's `State` extractor.
///
/// The controller is the single owner of all simulation state; the server
/// holds only this shared handle.
#[derive(Clone)]
pub struct ServerState {
    pub controller: Arc<Controller>,
    pub start_time: Instant,
    /// Poll interval of the `/stream` SSE subscription.
    pub stream_interval_ms: u64,
}

impl ServerState {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self {
            controller,
            start_time: Instant::now(),
            stream_interval_ms: 1_000,
        }
    }

    pub fn with_stream_interval(mut self, ms: u64) -> Self {
        self.stream_interval_ms = ms.max(50);
        self
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
