//! Shared test fixtures: in-memory store implementations and app builder.
//!
//! The services only talk to the collaborator traits, so the integration
//! tests run against in-memory stores instead of Postgres. Tests exercise
//! the same router and middleware stack that production uses.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use quire_api::config::ServerConfig;
use quire_api::router::build_app_router;
use quire_api::services::annotations::AnnotationService;
use quire_api::services::status::CampaignStatusService;
use quire_api::state::AppState;
use quire_api::ws::EditLockCoordinator;

use quire_core::annotation::{AnnotationTarget, PersistentAnnotation};
use quire_core::campaign::{Campaign, Question, StatisticMode};
use quire_core::error::CoreError;
use quire_core::log::{LogMessage, NewLogMessage};
use quire_core::store::{AnnotationStore, CampaignStore, LogStore, RecordIndexer};
use quire_core::types::DbId;

// ---------------------------------------------------------------------------
// In-memory stores
// ---------------------------------------------------------------------------

/// Campaign store backed by a HashMap.
#[derive(Default)]
pub struct MemoryCampaignStore {
    campaigns: Mutex<HashMap<DbId, Campaign>>,
}

impl MemoryCampaignStore {
    pub async fn insert(&self, campaign: Campaign) {
        self.campaigns.lock().await.insert(campaign.id, campaign);
    }

    /// Snapshot of the stored aggregate, as last saved.
    pub async fn get(&self, id: DbId) -> Option<Campaign> {
        self.campaigns.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn load_campaign(&self, id: DbId) -> Result<Option<Campaign>, CoreError> {
        Ok(self.campaigns.lock().await.get(&id).cloned())
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), CoreError> {
        self.campaigns
            .lock()
            .await
            .insert(campaign.id, campaign.clone());
        Ok(())
    }
}

/// Annotation store backed by a HashMap, with per-operation failure
/// injection to test partial-failure accounting.
#[derive(Default)]
pub struct MemoryAnnotationStore {
    rows: Mutex<HashMap<DbId, PersistentAnnotation>>,
    next_id: AtomicI64,
    pub fail_creates: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl MemoryAnnotationStore {
    /// Insert a pre-existing annotation, returning its assigned id.
    pub async fn seed(&self, mut annotation: PersistentAnnotation) -> DbId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        annotation.id = Some(id);
        self.rows.lock().await.insert(id, annotation);
        id
    }

    pub async fn all(&self) -> Vec<PersistentAnnotation> {
        let mut rows: Vec<_> = self.rows.lock().await.values().cloned().collect();
        rows.sort_by_key(|a| a.id);
        rows
    }
}

#[async_trait]
impl AnnotationStore for MemoryAnnotationStore {
    async fn list_for_target(
        &self,
        campaign_id: DbId,
        pi: &str,
        target: AnnotationTarget,
    ) -> Result<Vec<PersistentAnnotation>, CoreError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|a| a.campaign_id == campaign_id && a.pi == pi && a.target_page == target.page())
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        Ok(rows)
    }

    async fn create(&self, annotation: &PersistentAnnotation) -> Result<DbId, CoreError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("injected create failure".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut stored = annotation.clone();
        stored.id = Some(id);
        self.rows.lock().await.insert(id, stored);
        Ok(id)
    }

    async fn update(
        &self,
        id: DbId,
        body: &serde_json::Value,
        access_condition: Option<&str>,
    ) -> Result<(), CoreError> {
        if let Some(row) = self.rows.lock().await.get_mut(&id) {
            row.body = body.clone();
            row.access_condition = access_condition.map(str::to_owned);
        }
        Ok(())
    }

    async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("injected delete failure".to_string()));
        }
        self.rows.lock().await.remove(&id);
        Ok(())
    }
}

/// Log store backed by a Vec.
#[derive(Default)]
pub struct MemoryLogStore {
    rows: Mutex<Vec<LogMessage>>,
    next_id: AtomicI64,
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn add(&self, message: &NewLogMessage) -> Result<LogMessage, CoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = LogMessage {
            id,
            campaign_id: message.campaign_id,
            pi: message.pi.clone(),
            creator: message.creator.clone(),
            message: message.message.clone(),
            created_at: chrono::Utc::now(),
        };
        self.rows.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, campaign_id: DbId, pi: &str) -> Result<Vec<LogMessage>, CoreError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|m| m.campaign_id == campaign_id && m.pi == pi)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: DbId) -> Result<bool, CoreError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|m| m.id != id);
        Ok(rows.len() < before)
    }
}

/// Records reindex calls; optionally fails them.
#[derive(Default)]
pub struct RecordingIndexer {
    calls: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingIndexer {
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl RecordIndexer for RecordingIndexer {
    async fn trigger_reindex(&self, pi: &str) -> Result<(), CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("injected indexer failure".to_string()));
        }
        self.calls.lock().await.push(pi.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        ws_idle_timeout_secs: 120,
        indexer_url: None,
    }
}

/// A sample campaign with one question and no statistics yet.
pub fn sample_campaign(id: DbId, mode: StatisticMode) -> Campaign {
    Campaign {
        id,
        name: "Herbarium labels".to_string(),
        statistic_mode: mode,
        questions: vec![Question {
            text: "Transcribe the label".to_string(),
            metadata_fields: vec!["MD_LABEL".to_string()],
        }],
        restrict_annotation_access: false,
        show_log: false,
        access_condition: None,
        statistics: HashMap::new(),
    }
}

/// The application under test plus handles to its in-memory stores.
pub struct TestApp {
    pub app: Router,
    pub campaigns: Arc<MemoryCampaignStore>,
    pub annotations: Arc<MemoryAnnotationStore>,
    pub logs: Arc<MemoryLogStore>,
    pub indexer: Arc<RecordingIndexer>,
    pub coordinator: Arc<EditLockCoordinator>,
}

/// Build the full application router over in-memory stores, with the same
/// middleware stack production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();

    let campaigns = Arc::new(MemoryCampaignStore::default());
    let annotations = Arc::new(MemoryAnnotationStore::default());
    let logs = Arc::new(MemoryLogStore::default());
    let indexer = Arc::new(RecordingIndexer::default());
    let coordinator = Arc::new(EditLockCoordinator::new());

    let status_service = Arc::new(CampaignStatusService::new(
        campaigns.clone(),
        logs.clone(),
        indexer.clone(),
    ));
    let annotation_service = Arc::new(AnnotationService::new(
        annotations.clone(),
        campaigns.clone(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        status_service,
        annotation_service,
        lock_coordinator: coordinator.clone(),
    };

    TestApp {
        app: build_app_router(state, &config),
        campaigns,
        annotations,
        logs,
        indexer,
        coordinator,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET request to the app.
pub async fn get(app: Router, uri: &str) -> Response<axum::body::Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a request with a JSON body to the app.
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: &serde_json::Value,
) -> Response<axum::body::Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a DELETE request to the app.
pub async fn delete(app: Router, uri: &str) -> Response<axum::body::Body> {
    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
