//! Annotation rows.

use sqlx::FromRow;

use quire_core::annotation::PersistentAnnotation;
use quire_core::types::{DbId, Timestamp};

/// A row from the `annotations` table.
#[derive(Debug, Clone, FromRow)]
pub struct AnnotationRow {
    pub id: DbId,
    pub campaign_id: DbId,
    pub pi: String,
    pub target_page: Option<i32>,
    pub body: serde_json::Value,
    pub access_condition: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<AnnotationRow> for PersistentAnnotation {
    fn from(row: AnnotationRow) -> Self {
        Self {
            id: Some(row.id),
            campaign_id: row.campaign_id,
            pi: row.pi,
            target_page: row.target_page,
            body: row.body,
            access_condition: row.access_condition,
        }
    }
}
