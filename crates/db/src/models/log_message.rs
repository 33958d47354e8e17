//! Campaign log message rows.

use sqlx::FromRow;

use quire_core::log::LogMessage;
use quire_core::types::{DbId, Timestamp};

/// A row from the `campaign_log_messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct LogMessageRow {
    pub id: DbId,
    pub campaign_id: DbId,
    pub pi: String,
    pub creator: String,
    pub message: String,
    pub created_at: Timestamp,
}

impl From<LogMessageRow> for LogMessage {
    fn from(row: LogMessageRow) -> Self {
        Self {
            id: row.id,
            campaign_id: row.campaign_id,
            pi: row.pi,
            creator: row.creator,
            message: row.message,
            created_at: row.created_at,
        }
    }
}
