//! Adapters implementing the `quire-core` collaborator traits on Postgres.
//!
//! These are what the API crate wires into its services; sqlx errors
//! surface as `CoreError::Storage`.

use async_trait::async_trait;

use quire_core::annotation::{AnnotationTarget, PersistentAnnotation};
use quire_core::campaign::Campaign;
use quire_core::error::CoreError;
use quire_core::log::{LogMessage, NewLogMessage};
use quire_core::store::{AnnotationStore, CampaignStore, LogStore};
use quire_core::types::DbId;

use crate::models::campaign::assemble;
use crate::repositories::{AnnotationRepo, CampaignRepo, LogRepo};
use crate::DbPool;

fn storage_err(err: sqlx::Error) -> CoreError {
    CoreError::Storage(err.to_string())
}

/// Campaign aggregate persistence over Postgres.
pub struct PgCampaignStore {
    pool: DbPool,
}

impl PgCampaignStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignStore for PgCampaignStore {
    async fn load_campaign(&self, id: DbId) -> Result<Option<Campaign>, CoreError> {
        let Some(row) = CampaignRepo::fetch(&self.pool, id).await.map_err(storage_err)? else {
            return Ok(None);
        };
        let records = CampaignRepo::fetch_record_statistics(&self.pool, id)
            .await
            .map_err(storage_err)?;
        let pages = CampaignRepo::fetch_page_statistics(&self.pool, id)
            .await
            .map_err(storage_err)?;
        assemble(row, records, pages).map(Some)
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), CoreError> {
        CampaignRepo::save(&self.pool, campaign)
            .await
            .map_err(storage_err)
    }
}

/// Annotation persistence over Postgres.
pub struct PgAnnotationStore {
    pool: DbPool,
}

impl PgAnnotationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnotationStore for PgAnnotationStore {
    async fn list_for_target(
        &self,
        campaign_id: DbId,
        pi: &str,
        target: AnnotationTarget,
    ) -> Result<Vec<PersistentAnnotation>, CoreError> {
        let rows = AnnotationRepo::list_for_target(&self.pool, campaign_id, pi, target.page())
            .await
            .map_err(storage_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, annotation: &PersistentAnnotation) -> Result<DbId, CoreError> {
        AnnotationRepo::create(&self.pool, annotation)
            .await
            .map_err(storage_err)
    }

    async fn update(
        &self,
        id: DbId,
        body: &serde_json::Value,
        access_condition: Option<&str>,
    ) -> Result<(), CoreError> {
        let updated = AnnotationRepo::update(&self.pool, id, body, access_condition)
            .await
            .map_err(storage_err)?;
        if !updated {
            // The row vanished between list and update; the next
            // reconciliation pass will recreate the annotation.
            tracing::debug!(annotation_id = id, "Update hit no row, skipping");
        }
        Ok(())
    }

    async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        AnnotationRepo::delete(&self.pool, id)
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}

/// Campaign log persistence over Postgres.
pub struct PgLogStore {
    pool: DbPool,
}

impl PgLogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn add(&self, message: &NewLogMessage) -> Result<LogMessage, CoreError> {
        LogRepo::create(&self.pool, message)
            .await
            .map(Into::into)
            .map_err(storage_err)
    }

    async fn list(&self, campaign_id: DbId, pi: &str) -> Result<Vec<LogMessage>, CoreError> {
        let rows = LogRepo::list(&self.pool, campaign_id, pi)
            .await
            .map_err(storage_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: DbId) -> Result<bool, CoreError> {
        LogRepo::delete(&self.pool, id).await.map_err(storage_err)
    }
}
