//! Handlers for record items and crowdsourcing status transitions.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use quire_core::status::CrowdsourcingStatus;
use quire_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a status update request.
///
/// `page_index` is required for PAGE-mode campaigns and must be absent for
/// RECORD-mode campaigns; the mismatch surfaces as `INVALID_MODE`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub page_index: Option<i32>,
    pub status: CrowdsourcingStatus,
    pub acting_user: String,
}

/// GET /campaigns/{campaign_id}/records/{pi}
///
/// Record item snapshot: statuses per the campaign's statistic mode, plus
/// the log when the campaign exposes it.
pub async fn get_record_item(
    State(state): State<AppState>,
    Path((campaign_id, pi)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let item = state.status_service.record_item(campaign_id, &pi).await?;
    Ok(Json(DataResponse { data: item }))
}

/// PUT /campaigns/{campaign_id}/records/{pi}/status
///
/// Apply a status transition to the record or to one of its pages.
pub async fn set_status(
    State(state): State<AppState>,
    Path((campaign_id, pi)): Path<(DbId, String)>,
    Json(input): Json<SetStatusRequest>,
) -> AppResult<impl IntoResponse> {
    if input.acting_user.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Field 'acting_user' is required".to_string(),
        ));
    }

    let status = match input.page_index {
        Some(page_index) => {
            state
                .status_service
                .set_page_status(campaign_id, &pi, page_index, input.status, &input.acting_user)
                .await?
        }
        None => {
            state
                .status_service
                .set_record_status(campaign_id, &pi, input.status, &input.acting_user)
                .await?
        }
    };

    Ok(Json(DataResponse { data: status }))
}
