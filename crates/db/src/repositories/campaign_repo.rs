//! Repository for the campaign aggregate (`campaigns`,
//! `record_statistics`, `page_statistics`).

use sqlx::PgPool;

use quire_core::campaign::Campaign;
use quire_core::types::DbId;

use crate::models::campaign::{CampaignRow, PageStatisticRow, RecordStatisticRow};

/// Column list for campaigns queries.
const CAMPAIGN_COLUMNS: &str = "id, name, statistic_mode, questions, \
    restrict_annotation_access, show_log, access_condition, created_at, updated_at";

/// Loads and saves campaign aggregates.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Fetch the campaign row by id.
    pub async fn fetch(pool: &PgPool, id: DbId) -> Result<Option<CampaignRow>, sqlx::Error> {
        let query = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, CampaignRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch all record statistic rows for a campaign.
    pub async fn fetch_record_statistics(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<RecordStatisticRow>, sqlx::Error> {
        sqlx::query_as::<_, RecordStatisticRow>(
            "SELECT id, campaign_id, pi, status, annotators, reviewers
             FROM record_statistics
             WHERE campaign_id = $1
             ORDER BY pi",
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await
    }

    /// Fetch all page statistic rows for a campaign.
    pub async fn fetch_page_statistics(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<PageStatisticRow>, sqlx::Error> {
        sqlx::query_as::<_, PageStatisticRow>(
            "SELECT p.id, p.record_statistic_id, p.page_order, p.status,
                    p.annotators, p.reviewers
             FROM page_statistics p
             JOIN record_statistics r ON r.id = p.record_statistic_id
             WHERE r.campaign_id = $1
             ORDER BY p.page_order",
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await
    }

    /// Persist the whole aggregate in one transaction.
    ///
    /// The campaign row is upserted; statistics rows are replaced wholesale
    /// (delete cascades to page rows), which keeps the write simple and
    /// atomic for aggregates of this size.
    pub async fn save(pool: &PgPool, campaign: &Campaign) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let questions = serde_json::to_value(&campaign.questions)
            .unwrap_or_else(|_| serde_json::Value::Array(vec![]));

        sqlx::query(
            "INSERT INTO campaigns
                (id, name, statistic_mode, questions, restrict_annotation_access,
                 show_log, access_condition)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                statistic_mode = EXCLUDED.statistic_mode,
                questions = EXCLUDED.questions,
                restrict_annotation_access = EXCLUDED.restrict_annotation_access,
                show_log = EXCLUDED.show_log,
                access_condition = EXCLUDED.access_condition,
                updated_at = now()",
        )
        .bind(campaign.id)
        .bind(&campaign.name)
        .bind(campaign.statistic_mode.as_str())
        .bind(questions)
        .bind(campaign.restrict_annotation_access)
        .bind(campaign.show_log)
        .bind(&campaign.access_condition)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM record_statistics WHERE campaign_id = $1")
            .bind(campaign.id)
            .execute(&mut *tx)
            .await?;

        for stat in campaign.statistics.values() {
            let annotators: Vec<String> = stat.annotators.iter().cloned().collect();
            let reviewers: Vec<String> = stat.reviewers.iter().cloned().collect();

            let (record_statistic_id,): (DbId,) = sqlx::query_as(
                "INSERT INTO record_statistics
                    (campaign_id, pi, status, annotators, reviewers)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id",
            )
            .bind(campaign.id)
            .bind(&stat.pi)
            .bind(stat.status.as_str())
            .bind(&annotators)
            .bind(&reviewers)
            .fetch_one(&mut *tx)
            .await?;

            for page in stat.pages.values() {
                let annotators: Vec<String> = page.annotators.iter().cloned().collect();
                let reviewers: Vec<String> = page.reviewers.iter().cloned().collect();

                sqlx::query(
                    "INSERT INTO page_statistics
                        (record_statistic_id, page_order, status, annotators, reviewers)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(record_statistic_id)
                .bind(page.page_order)
                .bind(page.status.as_str())
                .bind(&annotators)
                .bind(&reviewers)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await
    }
}
