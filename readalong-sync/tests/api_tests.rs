//! Integration tests for the readalong-sync API endpoints
//!
//! Exercises the HTTP control surface end to end: position ingest and
//! queries, seeks, data endpoints, and calibration round trips. The engine
//! runs over a small in-memory transcript with the simulated player, so
//! seek delivery succeeds without retries.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

use readalong_common::events::EventBus;
use readalong_sync::api::{create_router, AppState};
use readalong_sync::state::{BookInfo, SharedState};
use readalong_sync::sync::{SimulatedPlayer, SyncEngine};
use readalong_sync::transcript::{Chapter, TimedUnit};

fn unit(text: &str, start: f64, end: f64, index: usize) -> TimedUnit {
    TimedUnit {
        text: text.to_string(),
        start,
        end,
        index,
    }
}

fn chapter(number: u32, start: f64, end: f64, start_word: usize, end_word: usize) -> Chapter {
    Chapter {
        id: format!("chapter-{}", number),
        number,
        title: format!("Chapter {}", number),
        description: None,
        start_time: start,
        end_time: end,
        start_word_index: start_word,
        end_word_index: end_word,
        word_count: end_word - start_word,
        duration_minutes: (end - start) / 60.0,
    }
}

/// Test helper: Create app with a three-word transcript and two chapters
fn setup_app() -> axum::Router {
    let events = Arc::new(EventBus::new(256));
    let engine = SyncEngine::new(
        vec![
            unit("Hi", 0.0, 0.5, 0),
            unit("there", 0.5, 1.0, 1),
            unit("friend", 1.2, 1.6, 2),
        ],
        vec![chapter(1, 0.0, 1.0, 0, 2), chapter(2, 1.0, 2.0, 2, 3)],
        events.clone(),
    );

    let state = SharedState::new(
        engine,
        Arc::new(SimulatedPlayer::new()),
        events,
        BookInfo {
            title: "The Harbor Year".to_string(),
            author: Some("Edda Lindqvist".to_string()),
            narrator: None,
            chapter_count: 2,
            word_count: 3,
            duration: Some(2.0),
        },
    );

    create_router(AppState {
        shared: Arc::new(state),
        port: 5760,
    })
}

/// Test helper: Create a GET request
fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Create a request carrying a JSON body
fn request_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "readalong-sync");
    assert!(body["version"].is_string());
    assert_eq!(body["book"], "The Harbor Year");
}

// =============================================================================
// Position Endpoints
// =============================================================================

#[tokio::test]
async fn test_position_tick_resolves_word_and_chapter() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/position",
            json!({"current_time": 0.6, "is_playing": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["word_index"], 1);
    assert_eq!(body["word_text"], "there");
    assert_eq!(body["chapter_index"], 0);
    assert_eq!(body["is_playing"], true);

    // The resolved state is readable back
    let response = app.oneshot(get("/api/v1/position")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["raw_time"], 0.6);
    assert_eq!(body["adjusted_time"], 0.6);
    assert_eq!(body["word_index"], 1);
    assert_eq!(body["position_display"], "0:00");
}

// =============================================================================
// Seek Endpoints
// =============================================================================

#[tokio::test]
async fn test_seek_to_time() {
    let app = setup_app();

    let response = app
        .oneshot(request_json("POST", "/api/v1/seek", json!({"time": 1.4})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["raw_time"], 1.4);
    assert_eq!(body["delivered"], true);
}

#[tokio::test]
async fn test_seek_to_word_pins_highlight() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/seek/word",
            json!({"word_index": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["raw_time"], 1.2);

    let response = app.oneshot(get("/api/v1/position")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["word_index"], 2);
    assert_eq!(body["chapter_index"], 1);
}

#[tokio::test]
async fn test_seek_to_unknown_word_is_not_found() {
    let app = setup_app();

    let response = app
        .oneshot(request_json(
            "POST",
            "/api/v1/seek/word",
            json!({"word_index": 99}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seek_chapter_by_index() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/seek/chapter",
            json!({"index": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["raw_time"], 1.0);

    // The chapter's first word is highlighted at its start
    let response = app.oneshot(get("/api/v1/position")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["chapter_index"], 1);
    assert_eq!(body["word_index"], 2);
}

#[tokio::test]
async fn test_seek_chapter_by_direction() {
    let app = setup_app();

    // Establish a position in chapter one first
    app.clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/position",
            json!({"current_time": 0.2, "is_playing": true}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/seek/chapter",
            json!({"direction": "next"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["raw_time"], 1.0);

    // No chapter after the last one
    let response = app
        .oneshot(request_json(
            "POST",
            "/api/v1/seek/chapter",
            json!({"direction": "next"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seek_chapter_requires_index_or_direction() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(request_json("POST", "/api/v1/seek/chapter", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request_json(
            "POST",
            "/api/v1/seek/chapter",
            json!({"index": 0, "direction": "next"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Data Endpoints
// =============================================================================

#[tokio::test]
async fn test_transcript_endpoint() {
    let app = setup_app();

    let response = app.oneshot(get("/api/v1/transcript")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["book"]["title"], "The Harbor Year");
    assert_eq!(body["word_count"], 3);
    assert_eq!(body["words"][0]["text"], "Hi");
    assert_eq!(body["words"][2]["start"], 1.2);
}

#[tokio::test]
async fn test_transcript_chapter_filter() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(get("/api/v1/transcript?chapter=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["chapter"], 1);
    assert_eq!(body["word_count"], 1);
    assert_eq!(body["words"][0]["text"], "friend");

    let response = app
        .oneshot(get("/api/v1/transcript?chapter=9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chapters_endpoint() {
    let app = setup_app();

    let response = app.oneshot(get("/api/v1/chapters")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let chapters = body["chapters"].as_array().unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0]["title"], "Chapter 1");
    assert_eq!(chapters[1]["start_time"], 1.0);
}

// =============================================================================
// Calibration Endpoints
// =============================================================================

#[tokio::test]
async fn test_calibration_update_applies_to_lookups() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(request_json(
            "PUT",
            "/api/v1/calibration",
            json!({"global_offset_seconds": 0.5, "playback_rate": 1.25}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["global_offset_seconds"], 0.5);
    assert_eq!(body["playback_rate"], 1.25);

    // raw 0.6 + offset 0.5 = adjusted 1.1: the gap after "there"
    let response = app
        .oneshot(request_json(
            "POST",
            "/api/v1/position",
            json!({"current_time": 0.6, "is_playing": true}),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["adjusted_time"], 1.1);
    assert_eq!(body["word_text"], "there");
}

#[tokio::test]
async fn test_sync_point_capture_and_derive() {
    let app = setup_app();

    // The user hears "there" (transcript 0.5) at player time 2.5
    app.clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/position",
            json!({"current_time": 2.5, "is_playing": true}),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/calibration/sync-point",
            json!({"word_index": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["point"]["expectedTime"], 0.5);
    assert_eq!(body["point"]["actualTime"], 2.5);
    assert_eq!(body["point"]["text"], "there");
    // First capture adopts its own delta
    assert_eq!(body["global_offset_seconds"], 2.0);

    // Second point: "friend" (transcript 1.2) heard at 4.2, delta 3.0
    app.clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/position",
            json!({"current_time": 4.2, "is_playing": true}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(request_json(
            "POST",
            "/api/v1/calibration/sync-point",
            json!({"word_index": 2}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(request_json("POST", "/api/v1/calibration/derive", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["global_offset_seconds"], 2.5);
    assert_eq!(body["sync_point_count"], 2);
}

#[tokio::test]
async fn test_derive_without_points_is_bad_request() {
    let app = setup_app();

    let response = app
        .oneshot(request_json("POST", "/api/v1/calibration/derive", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calibration_export_import_round_trip() {
    let app = setup_app();

    app.clone()
        .oneshot(request_json(
            "PUT",
            "/api/v1/calibration",
            json!({"global_offset_seconds": 1.5}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/v1/calibration/export"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let exported = extract_json(response.into_body()).await;
    assert_eq!(exported["globalOffset"], 1.5);
    assert_eq!(exported["playbackRate"], 1.0);
    assert!(exported["timestamp"].is_string());

    // Re-importing the exported document reproduces the state
    let response = app
        .oneshot(request_json(
            "POST",
            "/api/v1/calibration/import",
            exported,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["global_offset_seconds"], 1.5);
}

#[tokio::test]
async fn test_calibration_import_malformed_keeps_state() {
    let app = setup_app();

    app.clone()
        .oneshot(request_json(
            "PUT",
            "/api/v1/calibration",
            json!({"global_offset_seconds": 1.25}),
        ))
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/calibration/import")
        .body(Body::from("{bad"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["applied"], false);
    assert_eq!(body["global_offset_seconds"], 1.25);

    // The stored state is untouched
    let response = app.oneshot(get("/api/v1/calibration")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["global_offset_seconds"], 1.25);
}

#[tokio::test]
async fn test_calibration_reset() {
    let app = setup_app();

    app.clone()
        .oneshot(request_json(
            "PUT",
            "/api/v1/calibration",
            json!({"global_offset_seconds": 3.0, "playback_rate": 0.75}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request_json("POST", "/api/v1/calibration/reset", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/v1/calibration")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["global_offset_seconds"], 0.0);
    assert_eq!(body["playback_rate"], 1.0);
    assert!(body["sync_points"].as_array().unwrap().is_empty());
}

// =============================================================================
// SSE Events
// =============================================================================

#[tokio::test]
async fn test_events_endpoint_is_an_event_stream() {
    let app = setup_app();

    // Only the response head is inspected; the body is an open stream
    let response = app.oneshot(get("/api/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"));
}
