//! Integration tests for status transitions, record items, and the
//! campaign log, over in-memory stores.

mod common;

use std::sync::atomic::Ordering;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{body_json, delete, get, sample_campaign, send_json};
use quire_core::campaign::StatisticMode;

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn record_mode_full_lifecycle_with_attribution_and_reindex() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = send_json(
        test.app.clone(),
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"status": "REVIEW", "acting_user": "annotator1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], "REVIEW");

    let response = send_json(
        test.app.clone(),
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"status": "FINISHED", "acting_user": "reviewer1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], "FINISHED");

    // Attribution landed in the persisted aggregate.
    let campaign = test.campaigns.get(1).await.unwrap();
    let stat = &campaign.statistics["PPN1"];
    assert!(stat.annotators.contains("annotator1"));
    assert!(stat.reviewers.contains("reviewer1"));

    // Reaching FINISHED triggered exactly one reindex for the record.
    assert_eq!(test.indexer.calls().await, vec!["PPN1".to_string()]);
}

#[tokio::test]
async fn review_rejection_returns_record_to_annotate() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    send_json(
        test.app.clone(),
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"status": "REVIEW", "acting_user": "annotator1"}),
    )
    .await;

    let response = send_json(
        test.app.clone(),
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"status": "ANNOTATE", "acting_user": "reviewer1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], "ANNOTATE");

    // The rejection is a review action: the rejecting user is a reviewer.
    let campaign = test.campaigns.get(1).await.unwrap();
    assert!(campaign.statistics["PPN1"].reviewers.contains("reviewer1"));

    // Nothing finished, so no reindex.
    assert!(test.indexer.calls().await.is_empty());
}

#[tokio::test]
async fn skipping_review_is_rejected_as_invalid_transition() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = send_json(
        test.app,
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"status": "FINISHED", "acting_user": "annotator1"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn page_status_on_record_mode_campaign_is_invalid_mode() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = send_json(
        test.app,
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"page_index": 1, "status": "REVIEW", "acting_user": "u1"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_MODE");
}

#[tokio::test]
async fn record_status_on_page_mode_campaign_is_invalid_mode() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Page))
        .await;

    let response = send_json(
        test.app,
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"status": "REVIEW", "acting_user": "u1"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_MODE");
}

#[tokio::test]
async fn unknown_campaign_returns_404() {
    let test = common::build_test_app();

    let response = send_json(
        test.app,
        Method::PUT,
        "/api/v1/campaigns/99/records/PPN1/status",
        &json!({"status": "REVIEW", "acting_user": "u1"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn blank_acting_user_is_a_bad_request() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = send_json(
        test.app,
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"status": "REVIEW", "acting_user": "  "}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn reindex_failure_does_not_fail_the_transition() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Page))
        .await;
    test.indexer.fail.store(true, Ordering::SeqCst);

    send_json(
        test.app.clone(),
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"page_index": 1, "status": "REVIEW", "acting_user": "u1"}),
    )
    .await;

    let response = send_json(
        test.app.clone(),
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"page_index": 1, "status": "FINISHED", "acting_user": "r1"}),
    )
    .await;

    // The status change is durable even though the reindex signal failed.
    assert_eq!(response.status(), StatusCode::OK);
    let campaign = test.campaigns.get(1).await.unwrap();
    assert_eq!(
        campaign.page_statuses("PPN1")[&1],
        quire_core::status::CrowdsourcingStatus::Finished
    );
}

// ---------------------------------------------------------------------------
// Record item snapshots
// ---------------------------------------------------------------------------

#[tokio::test]
async fn record_item_in_record_mode_has_record_status_only() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = get(test.app, "/api/v1/campaigns/1/records/PPN1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["statistic_mode"], "RECORD");
    // Untouched records default to ANNOTATE.
    assert_eq!(data["record_status"], "ANNOTATE");
    assert!(data.get("page_statuses").is_none());
    assert!(data.get("log").is_none());
    assert_eq!(data["questions"][0]["text"], "Transcribe the label");
}

#[tokio::test]
async fn record_item_in_page_mode_has_touched_page_statuses() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Page))
        .await;

    send_json(
        test.app.clone(),
        Method::PUT,
        "/api/v1/campaigns/1/records/PPN1/status",
        &json!({"page_index": 3, "status": "REVIEW", "acting_user": "u1"}),
    )
    .await;

    let response = get(test.app, "/api/v1/campaigns/1/records/PPN1").await;
    let json = body_json(response).await;
    let data = &json["data"];

    assert_eq!(data["statistic_mode"], "PAGE");
    assert!(data.get("record_status").is_none());
    assert_eq!(data["page_statuses"]["3"], "REVIEW");
    // Untouched pages are simply absent.
    assert!(data["page_statuses"].get("1").is_none());
}

#[tokio::test]
async fn record_item_includes_log_when_campaign_shows_it() {
    let test = common::build_test_app();
    let mut campaign = sample_campaign(1, StatisticMode::Record);
    campaign.show_log = true;
    test.campaigns.insert(campaign).await;

    send_json(
        test.app.clone(),
        Method::POST,
        "/api/v1/campaigns/1/records/PPN1/log",
        &json!({"creator": "reviewer1", "message": "Rejected: page 3 illegible"}),
    )
    .await;

    let response = get(test.app, "/api/v1/campaigns/1/records/PPN1").await;
    let json = body_json(response).await;

    let log = json["data"]["log"].as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["message"], "Rejected: page 3 illegible");
}

// ---------------------------------------------------------------------------
// Campaign log
// ---------------------------------------------------------------------------

#[tokio::test]
async fn log_message_lifecycle() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = send_json(
        test.app.clone(),
        Method::POST,
        "/api/v1/campaigns/1/records/PPN1/log",
        &json!({"creator": "u1", "message": "First pass done"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let message_id = created["data"]["id"].as_i64().unwrap();

    let response = get(test.app.clone(), "/api/v1/campaigns/1/records/PPN1/log").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = delete(
        test.app.clone(),
        &format!("/api/v1/campaigns/1/records/PPN1/log/{message_id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(test.app, "/api/v1/campaigns/1/records/PPN1/log").await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn blank_log_message_is_rejected() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = send_json(
        test.app,
        Method::POST,
        "/api/v1/campaigns/1/records/PPN1/log",
        &json!({"creator": "u1", "message": "   "}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn deleting_unknown_log_message_returns_404() {
    let test = common::build_test_app();
    test.campaigns
        .insert(sample_campaign(1, StatisticMode::Record))
        .await;

    let response = delete(test.app, "/api/v1/campaigns/1/records/PPN1/log/42").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
