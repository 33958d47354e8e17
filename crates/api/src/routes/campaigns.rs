use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::{annotations, log, records};
use crate::state::AppState;

/// Build the campaign-scoped record routes (nested under `/campaigns`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{campaign_id}/records/{pi}",
            get(records::get_record_item),
        )
        .route(
            "/{campaign_id}/records/{pi}/status",
            put(records::set_status),
        )
        .route(
            "/{campaign_id}/records/{pi}/annotations",
            get(annotations::list_annotations).put(annotations::submit_annotations),
        )
        .route(
            "/{campaign_id}/records/{pi}/log",
            get(log::list_log_messages).post(log::create_log_message),
        )
        .route(
            "/{campaign_id}/records/{pi}/log/{message_id}",
            delete(log::delete_log_message),
        )
}
