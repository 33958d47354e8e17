//! Reindex trigger implementations.
//!
//! The status service signals these when a record finishes; both callers
//! and implementations treat the signal as best effort.

use async_trait::async_trait;

use quire_core::error::CoreError;
use quire_core::store::RecordIndexer;

/// Posts `{"pi": "..."}` to an external indexer endpoint.
pub struct HttpRecordIndexer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecordIndexer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RecordIndexer for HttpRecordIndexer {
    async fn trigger_reindex(&self, pi: &str) -> Result<(), CoreError> {
        self.client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "pi": pi }))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CoreError::Storage(format!("indexer request failed: {e}")))?;
        Ok(())
    }
}

/// Fallback used when no indexer endpoint is configured; records the
/// signal in the log and succeeds.
pub struct NoopRecordIndexer;

#[async_trait]
impl RecordIndexer for NoopRecordIndexer {
    async fn trigger_reindex(&self, pi: &str) -> Result<(), CoreError> {
        tracing::debug!(pi, "No indexer configured, reindex signal dropped");
        Ok(())
    }
}
