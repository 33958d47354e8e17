//! Handlers for annotation listing and submission.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use quire_core::annotation::{AnnotationTarget, SubmittedAnnotation};
use quire_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for listing annotations.
#[derive(Debug, Deserialize)]
pub struct ListAnnotationParams {
    /// Page index to scope the listing to; absent means the whole record.
    pub page: Option<i32>,
}

/// Body of an annotation submission.
///
/// Carries the complete desired annotation set for exactly one target;
/// entries missing from `annotations` are deleted from storage.
#[derive(Debug, Deserialize)]
pub struct SubmitAnnotationsRequest {
    pub target_page: Option<i32>,
    pub annotations: Vec<SubmittedAnnotation>,
}

/// GET /campaigns/{campaign_id}/records/{pi}/annotations?page=
///
/// List the persisted annotations for one target.
pub async fn list_annotations(
    State(state): State<AppState>,
    Path((campaign_id, pi)): Path<(DbId, String)>,
    Query(params): Query<ListAnnotationParams>,
) -> AppResult<impl IntoResponse> {
    let annotations = state
        .annotation_service
        .list(campaign_id, &pi, AnnotationTarget::from_page(params.page))
        .await?;

    Ok(Json(DataResponse { data: annotations }))
}

/// PUT /campaigns/{campaign_id}/records/{pi}/annotations
///
/// Reconcile the submitted annotation set against storage for one target.
pub async fn submit_annotations(
    State(state): State<AppState>,
    Path((campaign_id, pi)): Path<(DbId, String)>,
    Json(input): Json<SubmitAnnotationsRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .annotation_service
        .submit(
            campaign_id,
            &pi,
            AnnotationTarget::from_page(input.target_page),
            input.annotations,
        )
        .await?;

    Ok(Json(DataResponse { data: outcome }))
}
