//! Best-effort query telemetry

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::warn;

use crate::errors::Result;
use crate::models::SearchQueryLog;

/// Destination for query log records
#[async_trait]
pub trait SearchLogSink: Send + Sync {
    async fn write(&self, record: &SearchQueryLog) -> Result<()>;
}

/// Writes query logs on a detached task.
///
/// Failures and timeouts surface only as warnings; callers never wait on
/// or observe the write.
#[derive(Clone)]
pub struct SearchLogger {
    sink: Arc<dyn SearchLogSink>,
    timeout: Duration,
}

impl SearchLogger {
    pub fn new(sink: Arc<dyn SearchLogSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// Spawn the write and return immediately.
    ///
    /// The handle is only useful to tests; dropping it detaches the task.
    pub fn log(&self, record: SearchQueryLog) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let timeout = self.timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, sink.write(&record)).await {
                Ok(Ok(())) => debug!("Logged search query ({} results)", record.result_count),
                Ok(Err(e)) => warn!("Failed to log search query: {}", e),
                Err(_) => warn!(
                    "Search query log write timed out after {}ms",
                    timeout.as_millis()
                ),
            }
        })
    }
}
