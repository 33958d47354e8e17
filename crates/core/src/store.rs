//! Collaborator traits for storage and downstream indexing.
//!
//! The engine loads, mutates, and stores aggregates through these seams.
//! Atomicity and isolation of a whole-aggregate write (and of concurrent
//! loads/stores of the same campaign) are the implementation's
//! responsibility, typically via the persistence layer's own locking.

use async_trait::async_trait;

use crate::annotation::{AnnotationTarget, PersistentAnnotation};
use crate::campaign::Campaign;
use crate::error::CoreError;
use crate::log::{LogMessage, NewLogMessage};
use crate::types::DbId;

/// Whole-aggregate campaign persistence.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn load_campaign(&self, id: DbId) -> Result<Option<Campaign>, CoreError>;

    /// Persist the aggregate after an in-memory mutation. All or nothing.
    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), CoreError>;
}

/// Per-annotation persistence. Each operation is independent; the
/// reconciler applies them item by item and tolerates individual failures.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn list_for_target(
        &self,
        campaign_id: DbId,
        pi: &str,
        target: AnnotationTarget,
    ) -> Result<Vec<PersistentAnnotation>, CoreError>;

    /// Persist a new annotation, returning its assigned id.
    async fn create(&self, annotation: &PersistentAnnotation) -> Result<DbId, CoreError>;

    async fn update(
        &self,
        id: DbId,
        body: &serde_json::Value,
        access_condition: Option<&str>,
    ) -> Result<(), CoreError>;

    async fn delete(&self, id: DbId) -> Result<(), CoreError>;
}

/// Best-effort signal that a record's index entry is stale. Failures are
/// logged by the caller, never escalated: annotations are already durable
/// and indexing is eventually consistent.
#[async_trait]
pub trait RecordIndexer: Send + Sync {
    async fn trigger_reindex(&self, pi: &str) -> Result<(), CoreError>;
}

/// Campaign log persistence.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn add(&self, message: &NewLogMessage) -> Result<LogMessage, CoreError>;

    async fn list(&self, campaign_id: DbId, pi: &str) -> Result<Vec<LogMessage>, CoreError>;

    /// Returns true if a message was deleted.
    async fn delete(&self, id: DbId) -> Result<bool, CoreError>;
}
