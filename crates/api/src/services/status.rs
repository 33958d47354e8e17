//! Campaign status service: applies transitions to a loaded campaign
//! aggregate, persists the aggregate, and signals reindexing when a record
//! finishes.
//!
//! Each call loads, mutates, and stores the aggregate through the storage
//! collaborator; the aggregate is never shared in-process between
//! concurrent requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use quire_core::campaign::{Campaign, Question, StatisticMode};
use quire_core::error::CoreError;
use quire_core::log::{validate_log_message, LogMessage, NewLogMessage};
use quire_core::status::CrowdsourcingStatus;
use quire_core::store::{CampaignStore, LogStore, RecordIndexer};
use quire_core::types::DbId;

/// Snapshot of a record's crowdsourcing state within a campaign, as served
/// to editing clients.
#[derive(Debug, Serialize)]
pub struct RecordItem {
    pub campaign_id: DbId,
    pub pi: String,
    pub statistic_mode: StatisticMode,
    pub questions: Vec<Question>,
    /// Record-level status; only present in RECORD mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_status: Option<CrowdsourcingStatus>,
    /// Touched pages and their statuses; only present in PAGE mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_statuses: Option<BTreeMap<i32, CrowdsourcingStatus>>,
    /// Log entries, included iff the campaign has `show_log` set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<LogMessage>>,
}

/// Applies status transitions and serves record snapshots.
pub struct CampaignStatusService {
    campaigns: Arc<dyn CampaignStore>,
    logs: Arc<dyn LogStore>,
    indexer: Arc<dyn RecordIndexer>,
}

impl CampaignStatusService {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        logs: Arc<dyn LogStore>,
        indexer: Arc<dyn RecordIndexer>,
    ) -> Self {
        Self {
            campaigns,
            logs,
            indexer,
        }
    }

    async fn load(&self, campaign_id: DbId) -> Result<Campaign, CoreError> {
        self.campaigns
            .load_campaign(campaign_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Campaign",
                id: campaign_id.to_string(),
            })
    }

    /// Apply a record-level status change (RECORD-mode campaigns only),
    /// creating the record statistic on demand.
    pub async fn set_record_status(
        &self,
        campaign_id: DbId,
        pi: &str,
        status: CrowdsourcingStatus,
        acting_user: &str,
    ) -> Result<CrowdsourcingStatus, CoreError> {
        let mut campaign = self.load(campaign_id).await?;
        let new_status = campaign.set_record_status(pi, status, acting_user)?;
        self.campaigns.save_campaign(&campaign).await?;

        tracing::info!(
            campaign_id,
            pi,
            status = new_status.as_str(),
            acting_user,
            "Record status changed"
        );

        self.maybe_trigger_reindex(new_status, pi).await;
        Ok(new_status)
    }

    /// Apply a page-level status change (PAGE-mode campaigns only),
    /// creating record/page statistics on demand.
    pub async fn set_page_status(
        &self,
        campaign_id: DbId,
        pi: &str,
        page_order: i32,
        status: CrowdsourcingStatus,
        acting_user: &str,
    ) -> Result<CrowdsourcingStatus, CoreError> {
        let mut campaign = self.load(campaign_id).await?;
        let new_status = campaign.set_page_status(pi, page_order, status, acting_user)?;
        self.campaigns.save_campaign(&campaign).await?;

        tracing::info!(
            campaign_id,
            pi,
            page_order,
            status = new_status.as_str(),
            acting_user,
            "Page status changed"
        );

        self.maybe_trigger_reindex(new_status, pi).await;
        Ok(new_status)
    }

    /// Fire the reindex signal when a target reaches FINISHED. Best effort:
    /// failures are logged, never escalated, since annotations are already
    /// durable and indexing is eventually consistent.
    async fn maybe_trigger_reindex(&self, status: CrowdsourcingStatus, pi: &str) {
        if status != CrowdsourcingStatus::Finished {
            return;
        }
        match self.indexer.trigger_reindex(pi).await {
            Ok(()) => tracing::debug!(pi, "Record reindex triggered"),
            Err(e) => tracing::warn!(pi, error = %e, "Record reindex trigger failed"),
        }
    }

    /// Build the record item snapshot: per-page statuses in PAGE mode,
    /// record status in RECORD mode, log entries iff `show_log`.
    pub async fn record_item(&self, campaign_id: DbId, pi: &str) -> Result<RecordItem, CoreError> {
        let campaign = self.load(campaign_id).await?;

        let (record_status, page_statuses) = match campaign.statistic_mode {
            StatisticMode::Record => (Some(campaign.record_status(pi)), None),
            StatisticMode::Page => (None, Some(campaign.page_statuses(pi))),
        };

        let log = if campaign.show_log {
            Some(self.logs.list(campaign_id, pi).await?)
        } else {
            None
        };

        Ok(RecordItem {
            campaign_id,
            pi: pi.to_string(),
            statistic_mode: campaign.statistic_mode,
            questions: campaign.questions,
            record_status,
            page_statuses,
            log,
        })
    }

    /// Add a log message after verifying the campaign exists.
    pub async fn add_log_message(&self, input: NewLogMessage) -> Result<LogMessage, CoreError> {
        validate_log_message(&input.message)?;
        self.load(input.campaign_id).await?;
        self.logs.add(&input).await
    }

    /// List log messages for a (campaign, record).
    pub async fn log_messages(
        &self,
        campaign_id: DbId,
        pi: &str,
    ) -> Result<Vec<LogMessage>, CoreError> {
        self.load(campaign_id).await?;
        self.logs.list(campaign_id, pi).await
    }

    /// Delete a log message by id.
    pub async fn delete_log_message(&self, id: DbId) -> Result<(), CoreError> {
        if self.logs.delete(id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: "LogMessage",
                id: id.to_string(),
            })
        }
    }
}
