//! REST API implementation for the sync service
//!
//! Thin control surface over the alignment engine: position ingest and
//! queries, seeks, calibration, and the SSE event stream.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared engine/player/event state
    pub shared: Arc<SharedState>,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Position endpoints
            .route("/position", get(handlers::get_position))
            .route("/position", post(handlers::post_position))

            // Seek endpoints
            .route("/seek", post(handlers::seek))
            .route("/seek/word", post(handlers::seek_word))
            .route("/seek/chapter", post(handlers::seek_chapter))

            // Data endpoints
            .route("/transcript", get(handlers::get_transcript))
            .route("/chapters", get(handlers::get_chapters))

            // Calibration endpoints
            .route("/calibration", get(handlers::get_calibration))
            .route("/calibration", put(handlers::put_calibration))
            .route("/calibration/reset", post(handlers::reset_calibration))
            .route("/calibration/sync-point", post(handlers::capture_sync_point))
            .route("/calibration/derive", post(handlers::derive_offset))
            .route("/calibration/export", get(handlers::export_calibration))
            .route("/calibration/import", post(handlers::import_calibration))

            // SSE events
            .route("/events", get(sse::event_stream))
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "readalong-sync",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "book": state.shared.book.title,
    }))
}
