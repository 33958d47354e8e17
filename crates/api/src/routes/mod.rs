pub mod campaigns;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                                  edit-lock WebSocket
///
/// /campaigns/{campaign_id}/records/{pi}                record item (GET)
/// /campaigns/{campaign_id}/records/{pi}/status         set status (PUT)
/// /campaigns/{campaign_id}/records/{pi}/annotations    list, submit (GET, PUT)
/// /campaigns/{campaign_id}/records/{pi}/log            list, create (GET, POST)
/// /campaigns/{campaign_id}/records/{pi}/log/{id}       delete (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Edit-lock WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Campaign-scoped record resources.
        .nest("/campaigns", campaigns::router())
}
