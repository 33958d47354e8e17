use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::annotations::AnnotationService;
use crate::services::status::CampaignStatusService;
use crate::ws::EditLockCoordinator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Status transitions, record item snapshots, and the campaign log.
    pub status_service: Arc<CampaignStatusService>,
    /// Annotation submission/reconciliation per target.
    pub annotation_service: Arc<AnnotationService>,
    /// Advisory page-claim tracking for live editing connections.
    pub lock_coordinator: Arc<EditLockCoordinator>,
}
