//! Handlers for the per-record campaign log.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use quire_core::log::NewLogMessage;
use quire_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a log message creation request.
#[derive(Debug, Deserialize)]
pub struct CreateLogMessageRequest {
    pub creator: String,
    pub message: String,
}

/// GET /campaigns/{campaign_id}/records/{pi}/log
pub async fn list_log_messages(
    State(state): State<AppState>,
    Path((campaign_id, pi)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let messages = state.status_service.log_messages(campaign_id, &pi).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /campaigns/{campaign_id}/records/{pi}/log
pub async fn create_log_message(
    State(state): State<AppState>,
    Path((campaign_id, pi)): Path<(DbId, String)>,
    Json(input): Json<CreateLogMessageRequest>,
) -> AppResult<impl IntoResponse> {
    if input.creator.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Field 'creator' is required".to_string(),
        ));
    }

    let message = state
        .status_service
        .add_log_message(NewLogMessage {
            campaign_id,
            pi,
            creator: input.creator,
            message: input.message,
        })
        .await?;

    tracing::info!(
        campaign_id,
        pi = %message.pi,
        message_id = message.id,
        "Log message created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

/// DELETE /campaigns/{campaign_id}/records/{pi}/log/{message_id}
pub async fn delete_log_message(
    State(state): State<AppState>,
    Path((campaign_id, _pi, message_id)): Path<(DbId, String, DbId)>,
) -> AppResult<impl IntoResponse> {
    state.status_service.delete_log_message(message_id).await?;

    tracing::info!(campaign_id, message_id, "Log message deleted");

    Ok(StatusCode::NO_CONTENT)
}
