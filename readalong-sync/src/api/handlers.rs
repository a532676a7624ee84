//! HTTP request handlers
//!
//! Implements the position, seek, data, and calibration endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::state::BookInfo;
use crate::sync::{
    seek_with_retry, CalibrationDocument, DriftReport, EngineStatus, PlaybackPosition, SyncPoint,
};
use crate::transcript::{Chapter, TimedUnit};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct TickRequest {
    /// Raw player time in seconds
    current_time: f64,
    #[serde(default)]
    is_playing: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// Target time in adjusted (transcript) seconds
    time: f64,
}

#[derive(Debug, Deserialize)]
pub struct WordSeekRequest {
    word_index: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekDirection {
    Next,
    Previous,
}

#[derive(Debug, Deserialize)]
pub struct ChapterSeekRequest {
    /// Explicit chapter index
    #[serde(default)]
    index: Option<usize>,
    /// Or a jump relative to the active chapter
    #[serde(default)]
    direction: Option<SeekDirection>,
}

#[derive(Debug, Serialize)]
pub struct SeekResponse {
    status: String,
    /// Raw player time the seek was issued at
    raw_time: f64,
    /// Whether the player accepted the command (false: optimistic state
    /// only, player was never moved)
    delivered: bool,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptQuery {
    /// Restrict the response to one chapter's words
    #[serde(default)]
    chapter: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    book: BookInfo,
    /// Chapter filter applied, if any
    chapter: Option<usize>,
    word_count: usize,
    words: Vec<TimedUnit>,
}

#[derive(Debug, Serialize)]
pub struct ChaptersResponse {
    book: BookInfo,
    chapters: Vec<Chapter>,
}

#[derive(Debug, Serialize)]
pub struct CalibrationResponse {
    global_offset_seconds: f64,
    playback_rate: f64,
    sync_points: Vec<SyncPoint>,
    drift: DriftReport,
}

#[derive(Debug, Deserialize)]
pub struct CalibrationUpdateRequest {
    #[serde(default)]
    global_offset_seconds: Option<f64>,
    #[serde(default)]
    playback_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SyncPointResponse {
    status: String,
    point: SyncPoint,
    global_offset_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct DeriveResponse {
    global_offset_seconds: f64,
    sync_point_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    status: String,
    /// False when the document failed to parse and prior state was kept
    applied: bool,
    global_offset_seconds: f64,
}

// ============================================================================
// Position Endpoints
// ============================================================================

/// GET /position - Current resolved playback state
pub async fn get_position(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.shared.engine.read().await.status())
}

/// POST /position - Ingest a position tick from the external player
///
/// Returns the resolved state so the client can correct itself in the same
/// round trip.
pub async fn post_position(
    State(state): State<AppState>,
    Json(req): Json<TickRequest>,
) -> Json<EngineStatus> {
    state.shared.player.notice_tick();

    let mut engine = state.shared.engine.write().await;
    engine.handle_tick(PlaybackPosition {
        current_time: req.current_time,
        is_playing: req.is_playing,
    });
    Json(engine.status())
}

// ============================================================================
// Seek Endpoints
// ============================================================================

/// POST /seek - Seek to an adjusted (transcript-domain) time
pub async fn seek(
    State(state): State<AppState>,
    Json(req): Json<SeekRequest>,
) -> Json<SeekResponse> {
    let raw = state.shared.engine.write().await.prepare_seek(req.time);
    let delivered = seek_with_retry(state.shared.player.as_ref(), raw).await;

    Json(SeekResponse {
        status: "ok".to_string(),
        raw_time: raw,
        delivered,
    })
}

/// POST /seek/word - Seek to a word's start time
pub async fn seek_word(
    State(state): State<AppState>,
    Json(req): Json<WordSeekRequest>,
) -> Result<Json<SeekResponse>> {
    let raw = state
        .shared
        .engine
        .write()
        .await
        .prepare_word_seek(req.word_index)?;
    let delivered = seek_with_retry(state.shared.player.as_ref(), raw).await;

    Ok(Json(SeekResponse {
        status: "ok".to_string(),
        raw_time: raw,
        delivered,
    }))
}

/// POST /seek/chapter - Jump to a chapter by index or relative direction
pub async fn seek_chapter(
    State(state): State<AppState>,
    Json(req): Json<ChapterSeekRequest>,
) -> Result<Json<SeekResponse>> {
    let target = match (req.index, req.direction) {
        (Some(index), None) => index,
        (None, Some(direction)) => {
            let engine = state.shared.engine.read().await;
            engine
                .adjacent_chapter(matches!(direction, SeekDirection::Next))
                .ok_or_else(|| Error::NotFound("no adjacent chapter".to_string()))?
        }
        _ => {
            return Err(Error::BadRequest(
                "provide exactly one of index or direction".to_string(),
            ))
        }
    };

    let raw = state
        .shared
        .engine
        .write()
        .await
        .prepare_chapter_jump(target)?;
    let delivered = seek_with_retry(state.shared.player.as_ref(), raw).await;

    Ok(Json(SeekResponse {
        status: "ok".to_string(),
        raw_time: raw,
        delivered,
    }))
}

// ============================================================================
// Data Endpoints
// ============================================================================

/// GET /transcript - Loaded words, optionally restricted to one chapter
pub async fn get_transcript(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Json<TranscriptResponse>> {
    let engine = state.shared.engine.read().await;
    let units = engine.words().units();

    let words = match query.chapter {
        Some(index) => {
            let chapter = engine
                .chapters()
                .chapter(index)
                .ok_or_else(|| Error::NotFound(format!("chapter index {}", index)))?;
            chapter.words(units).to_vec()
        }
        None => units.to_vec(),
    };

    Ok(Json(TranscriptResponse {
        book: state.shared.book.clone(),
        chapter: query.chapter,
        word_count: words.len(),
        words,
    }))
}

/// GET /chapters - Chapter table
pub async fn get_chapters(State(state): State<AppState>) -> Json<ChaptersResponse> {
    let engine = state.shared.engine.read().await;

    Json(ChaptersResponse {
        book: state.shared.book.clone(),
        chapters: engine.chapters().chapters().to_vec(),
    })
}

// ============================================================================
// Calibration Endpoints
// ============================================================================

/// GET /calibration - Current calibration state and drift diagnostics
pub async fn get_calibration(State(state): State<AppState>) -> Json<CalibrationResponse> {
    let engine = state.shared.engine.read().await;
    let calibration = engine.calibration();

    Json(CalibrationResponse {
        global_offset_seconds: calibration.global_offset_seconds(),
        playback_rate: calibration.playback_rate(),
        sync_points: calibration.sync_points().to_vec(),
        drift: engine.drift_report(),
    })
}

/// PUT /calibration - Adjust the offset and/or playback rate
pub async fn put_calibration(
    State(state): State<AppState>,
    Json(req): Json<CalibrationUpdateRequest>,
) -> Json<CalibrationResponse> {
    let mut engine = state.shared.engine.write().await;

    if let Some(offset) = req.global_offset_seconds {
        info!("Calibration offset set to {:.2}s", offset);
        engine.set_offset(offset);
    }
    if let Some(rate) = req.playback_rate {
        let applied = engine.set_rate(rate);
        state.shared.player.set_rate(applied);
    }

    let calibration = engine.calibration();
    Json(CalibrationResponse {
        global_offset_seconds: calibration.global_offset_seconds(),
        playback_rate: calibration.playback_rate(),
        sync_points: calibration.sync_points().to_vec(),
        drift: engine.drift_report(),
    })
}

/// POST /calibration/reset - Return calibration to defaults
pub async fn reset_calibration(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut engine = state.shared.engine.write().await;
    engine.reset_calibration();
    state.shared.player.set_rate(engine.calibration().playback_rate());

    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// POST /calibration/sync-point - Capture a sync point at the current
/// player position
pub async fn capture_sync_point(
    State(state): State<AppState>,
    Json(req): Json<WordSeekRequest>,
) -> Result<Json<SyncPointResponse>> {
    let mut engine = state.shared.engine.write().await;
    let point = engine.capture_sync_point(req.word_index)?;

    Ok(Json(SyncPointResponse {
        status: "ok".to_string(),
        point,
        global_offset_seconds: engine.calibration().global_offset_seconds(),
    }))
}

/// POST /calibration/derive - Recompute the offset from captured points
pub async fn derive_offset(State(state): State<AppState>) -> Result<Json<DeriveResponse>> {
    let mut engine = state.shared.engine.write().await;
    let derived = engine
        .derive_offset()
        .ok_or_else(|| Error::BadRequest("no sync points captured".to_string()))?;

    Ok(Json(DeriveResponse {
        global_offset_seconds: derived,
        sync_point_count: engine.calibration().sync_points().len(),
    }))
}

/// GET /calibration/export - Calibration snapshot as a portable document
pub async fn export_calibration(State(state): State<AppState>) -> Json<CalibrationDocument> {
    Json(state.shared.engine.read().await.export_calibration())
}

/// POST /calibration/import - Best-effort import of an exported document
///
/// Accepts the raw body so a malformed document reaches the engine's parse
/// boundary instead of being rejected at the extractor; a failed parse
/// keeps the prior state and reports `applied: false`.
pub async fn import_calibration(
    State(state): State<AppState>,
    body: String,
) -> Json<ImportResponse> {
    let mut engine = state.shared.engine.write().await;
    let applied = engine.import_calibration(&body);
    if applied {
        state.shared.player.set_rate(engine.calibration().playback_rate());
    }

    Json(ImportResponse {
        status: "ok".to_string(),
        applied,
        global_offset_seconds: engine.calibration().global_offset_seconds(),
    })
}
