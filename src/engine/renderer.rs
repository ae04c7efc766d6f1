//! Streaming render requests against the supervised engine.

use crate::engine::EngineSupervisor;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Renders markup to SVG through the shared streaming process.
///
/// Concurrent calls are pipelined: each is written to the same process in
/// order and receives the document produced for it. A timed-out call leaves
/// the process running.
#[derive(Clone)]
pub struct Renderer {
    supervisor: Arc<EngineSupervisor>,
    timeout: Duration,
}

impl Renderer {
    pub fn new(supervisor: Arc<EngineSupervisor>, timeout: Duration) -> Self {
        Self {
            supervisor,
            timeout,
        }
    }

    /// Render `markup`, failing with `RenderTimeout` if no document arrives in time.
    pub async fn render(&self, markup: &str) -> Result<String> {
        let session = self.supervisor.ensure_live().await?;
        session.request(markup, self.timeout).await
    }
}
