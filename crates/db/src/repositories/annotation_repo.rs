//! Repository for the `annotations` table.

use sqlx::PgPool;

use quire_core::annotation::PersistentAnnotation;
use quire_core::types::DbId;

use crate::models::annotation::AnnotationRow;

/// Column list for annotations queries.
const COLUMNS: &str = "id, campaign_id, pi, target_page, body, access_condition, \
    created_at, updated_at";

/// Provides per-annotation CRUD; each operation is independent so the
/// reconciler can apply them item by item.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// List annotations for one target. `target_page` None selects the
    /// whole-record annotations only (never mixed with page targets).
    pub async fn list_for_target(
        pool: &PgPool,
        campaign_id: DbId,
        pi: &str,
        target_page: Option<i32>,
    ) -> Result<Vec<AnnotationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE campaign_id = $1 AND pi = $2
               AND target_page IS NOT DISTINCT FROM $3
             ORDER BY id"
        );
        sqlx::query_as::<_, AnnotationRow>(&query)
            .bind(campaign_id)
            .bind(pi)
            .bind(target_page)
            .fetch_all(pool)
            .await
    }

    /// Insert a new annotation, returning its assigned id.
    pub async fn create(
        pool: &PgPool,
        annotation: &PersistentAnnotation,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO annotations
                (campaign_id, pi, target_page, body, access_condition)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(annotation.campaign_id)
        .bind(&annotation.pi)
        .bind(annotation.target_page)
        .bind(&annotation.body)
        .bind(&annotation.access_condition)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// Replace an annotation's body and access condition.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        body: &serde_json::Value,
        access_condition: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE annotations
             SET body = $1, access_condition = $2, updated_at = now()
             WHERE id = $3",
        )
        .bind(body)
        .bind(access_condition)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an annotation by id. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
