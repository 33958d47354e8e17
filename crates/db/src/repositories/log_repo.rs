//! Repository for the `campaign_log_messages` table.

use sqlx::PgPool;

use quire_core::log::NewLogMessage;
use quire_core::types::DbId;

use crate::models::log_message::LogMessageRow;

/// Column list for campaign_log_messages queries.
const COLUMNS: &str = "id, campaign_id, pi, creator, message, created_at";

/// Provides CRUD for campaign log messages.
pub struct LogRepo;

impl LogRepo {
    /// Insert a log message, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewLogMessage,
    ) -> Result<LogMessageRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaign_log_messages (campaign_id, pi, creator, message)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LogMessageRow>(&query)
            .bind(input.campaign_id)
            .bind(&input.pi)
            .bind(&input.creator)
            .bind(&input.message)
            .fetch_one(pool)
            .await
    }

    /// List log messages for a (campaign, record), oldest first.
    pub async fn list(
        pool: &PgPool,
        campaign_id: DbId,
        pi: &str,
    ) -> Result<Vec<LogMessageRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaign_log_messages
             WHERE campaign_id = $1 AND pi = $2
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, LogMessageRow>(&query)
            .bind(campaign_id)
            .bind(pi)
            .fetch_all(pool)
            .await
    }

    /// Delete a log message by id. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaign_log_messages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
