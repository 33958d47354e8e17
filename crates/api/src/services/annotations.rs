//! Annotation submission service.
//!
//! Reconciles a client-submitted annotation set against the persisted set
//! for one target and applies the resulting diff item by item. Passes for
//! the same (campaign, record, target) are serialized through a per-target
//! async mutex so two concurrent submissions cannot interleave their
//! delete/create operations; different targets proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use quire_core::annotation::{
    validate_annotation_body, AnnotationTarget, PersistentAnnotation, SubmittedAnnotation,
};
use quire_core::error::CoreError;
use quire_core::reconcile::reconcile;
use quire_core::store::{AnnotationStore, CampaignStore};
use quire_core::types::DbId;

/// Per-item outcome counts of one reconciliation pass.
///
/// Individual storage failures do not abort the pass; they show up in
/// `failed` while the remaining items are still applied.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

type TargetKey = (DbId, String, AnnotationTarget);

/// One mutex per in-flight target. Entries are pruned after a pass
/// completes, so the map tracks the targets currently being reconciled
/// rather than every target ever edited.
#[derive(Default)]
struct TargetLocks {
    inner: Mutex<HashMap<TargetKey, Arc<Mutex<()>>>>,
}

impl TargetLocks {
    async fn acquire(&self, key: &TargetKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the entry once no pass holds it or waits on it. The caller's
    /// guard must be dropped first, otherwise its clone keeps the entry.
    async fn release(&self, key: &TargetKey) {
        let mut map = self.inner.lock().await;
        if map.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(key);
        }
    }
}

/// Reconciles and persists client annotation submissions.
pub struct AnnotationService {
    annotations: Arc<dyn AnnotationStore>,
    campaigns: Arc<dyn CampaignStore>,
    target_locks: TargetLocks,
}

impl AnnotationService {
    pub fn new(annotations: Arc<dyn AnnotationStore>, campaigns: Arc<dyn CampaignStore>) -> Self {
        Self {
            annotations,
            campaigns,
            target_locks: TargetLocks::default(),
        }
    }

    /// List the persisted annotations for one target.
    pub async fn list(
        &self,
        campaign_id: DbId,
        pi: &str,
        target: AnnotationTarget,
    ) -> Result<Vec<PersistentAnnotation>, CoreError> {
        self.annotations.list_for_target(campaign_id, pi, target).await
    }

    /// Make the persisted set for one target match `submitted`.
    ///
    /// The whole pass covers exactly one target; reconciliation is never
    /// mixed across targets, so submitting page 3's set cannot delete
    /// page 4's annotations.
    pub async fn submit(
        &self,
        campaign_id: DbId,
        pi: &str,
        target: AnnotationTarget,
        submitted: Vec<SubmittedAnnotation>,
    ) -> Result<SubmissionOutcome, CoreError> {
        for annotation in &submitted {
            validate_annotation_body(&annotation.body)?;
        }

        let campaign = self
            .campaigns
            .load_campaign(campaign_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Campaign",
                id: campaign_id.to_string(),
            })?;
        let access_condition = campaign.annotation_access_condition().map(str::to_owned);

        // At most one reconciliation per target at a time.
        let key = (campaign_id, pi.to_string(), target);
        let guard = self.target_locks.acquire(&key).await;
        let result = self
            .apply_submission(campaign_id, pi, target, submitted, access_condition)
            .await;
        drop(guard);
        self.target_locks.release(&key).await;
        result
    }

    async fn apply_submission(
        &self,
        campaign_id: DbId,
        pi: &str,
        target: AnnotationTarget,
        submitted: Vec<SubmittedAnnotation>,
        access_condition: Option<String>,
    ) -> Result<SubmissionOutcome, CoreError> {
        let stored = self.annotations.list_for_target(campaign_id, pi, target).await?;
        let diff = reconcile(&stored, submitted);

        let mut outcome = SubmissionOutcome::default();

        for id in diff.to_delete {
            match self.annotations.delete(id).await {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(annotation_id = id, error = %e, "Annotation delete failed");
                }
            }
        }

        for annotation in diff.to_update {
            // Every to_update entry carries an id by construction.
            let Some(id) = annotation.id else { continue };
            match self
                .annotations
                .update(id, &annotation.body, access_condition.as_deref())
                .await
            {
                Ok(()) => outcome.updated += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(annotation_id = id, error = %e, "Annotation update failed");
                }
            }
        }

        for annotation in diff.to_create {
            let record = PersistentAnnotation {
                id: None,
                campaign_id,
                pi: pi.to_string(),
                target_page: target.page(),
                body: annotation.body,
                access_condition: access_condition.clone(),
            };
            match self.annotations.create(&record).await {
                Ok(_) => outcome.created += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(campaign_id, pi, error = %e, "Annotation create failed");
                }
            }
        }

        tracing::info!(
            campaign_id,
            pi,
            target_page = ?target.page(),
            created = outcome.created,
            updated = outcome.updated,
            deleted = outcome.deleted,
            failed = outcome.failed,
            "Annotation submission reconciled"
        );

        Ok(outcome)
    }
}
