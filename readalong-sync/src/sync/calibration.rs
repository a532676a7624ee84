//! Calibration state for audio/transcript drift
//!
//! The transcript is timed independently of the externally hosted
//! recording, so playback drifts by a roughly constant amount. A single
//! global offset, adjusted by slider or derived from user-captured sync
//! points, compensates: every raw player time is shifted by the offset
//! before any timeline lookup, and seek targets are shifted back.
//!
//! Calibration lives in memory only. It can be exported to and imported
//! from a flat JSON document; import is best-effort with per-field
//! defaulting, and a malformed document leaves the prior state untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

/// Playback rate bounds exposed by the calibration UI
pub const MIN_PLAYBACK_RATE: f64 = 0.5;
pub const MAX_PLAYBACK_RATE: f64 = 1.5;

/// A user-captured correspondence between transcript time and player time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPoint {
    /// Point identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Where the transcript places the word (base time, pre-offset)
    #[serde(default)]
    pub expected_time: f64,
    /// Where the user actually heard it in the recording
    #[serde(default)]
    pub actual_time: f64,
    /// Word text, for display in the captured-points list
    #[serde(default)]
    pub text: String,
}

impl SyncPoint {
    /// Per-point drift between recording and transcript (seconds)
    pub fn delta(&self) -> f64 {
        self.actual_time - self.expected_time
    }
}

/// Export/import document: `{ "globalOffset": ..., "playbackRate": ...,
/// "syncPoints": [...], "timestamp": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationDocument {
    #[serde(default)]
    pub global_offset: f64,
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,
    #[serde(default)]
    pub sync_points: Vec<SyncPoint>,
    /// Export time; tolerated absent on import
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_playback_rate() -> f64 {
    1.0
}

/// Mutable calibration state
///
/// Single-owner UI state: reset on load, mutated by slider and capture
/// actions, never persisted server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Seconds added to raw player time before every lookup
    global_offset_seconds: f64,
    /// Player speed multiplier
    playback_rate: f64,
    /// Captured sync points, in capture order
    sync_points: Vec<SyncPoint>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            global_offset_seconds: 0.0,
            playback_rate: 1.0,
            sync_points: Vec::new(),
        }
    }
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate raw player time into transcript time
    pub fn adjust(&self, raw_time: f64) -> f64 {
        raw_time + self.global_offset_seconds
    }

    /// Translate transcript time back into raw player time (seek targets)
    pub fn to_raw(&self, adjusted_time: f64) -> f64 {
        adjusted_time - self.global_offset_seconds
    }

    pub fn global_offset_seconds(&self) -> f64 {
        self.global_offset_seconds
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn sync_points(&self) -> &[SyncPoint] {
        &self.sync_points
    }

    pub fn set_offset(&mut self, offset_seconds: f64) {
        self.global_offset_seconds = offset_seconds;
    }

    /// Set the playback rate, clamped to the supported range
    pub fn set_rate(&mut self, rate: f64) {
        self.playback_rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
    }

    /// Record a sync point
    ///
    /// `expected_time` is the transcript's base time for the word,
    /// `actual_time` the raw player time the user heard it at. Capturing
    /// the very first point immediately adopts that point's delta as the
    /// offset; later points wait for an explicit [`derive_offset`] so the
    /// user can collect several before averaging.
    ///
    /// [`derive_offset`]: Calibration::derive_offset
    pub fn capture(&mut self, expected_time: f64, actual_time: f64, text: &str) -> SyncPoint {
        let point = SyncPoint {
            id: Uuid::new_v4(),
            expected_time,
            actual_time,
            text: text.to_string(),
        };

        let first_capture = self.sync_points.is_empty();
        self.sync_points.push(point.clone());

        if first_capture {
            self.global_offset_seconds = point.delta();
            info!(
                "First sync point \"{}\": offset set to {:.2}s",
                point.text, self.global_offset_seconds
            );
        }

        point
    }

    /// Recompute the offset as the mean delta over all captured points
    ///
    /// Simple averaging, no outlier rejection, no weighting. Returns the
    /// new offset, or `None` when no points have been captured.
    pub fn derive_offset(&mut self) -> Option<f64> {
        if self.sync_points.is_empty() {
            return None;
        }

        let sum: f64 = self.sync_points.iter().map(SyncPoint::delta).sum();
        self.global_offset_seconds = sum / self.sync_points.len() as f64;

        info!(
            "Derived offset {:.2}s from {} sync points",
            self.global_offset_seconds,
            self.sync_points.len()
        );
        Some(self.global_offset_seconds)
    }

    /// Discard all sync points and return offset and rate to defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Snapshot the state as an export document, stamped with the current time
    pub fn export(&self) -> CalibrationDocument {
        CalibrationDocument {
            global_offset: self.global_offset_seconds,
            playback_rate: self.playback_rate,
            sync_points: self.sync_points.clone(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Replace the state from an export document
    pub fn apply(&mut self, doc: CalibrationDocument) {
        self.global_offset_seconds = doc.global_offset;
        self.playback_rate = doc
            .playback_rate
            .clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        self.sync_points = doc.sync_points;
    }

    /// Import calibration from JSON text, best-effort
    ///
    /// Missing fields default (offset 0, rate 1.0, no points). A document
    /// that fails to parse at all leaves the prior state untouched; the
    /// failure is logged and reported as `false`.
    pub fn import_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<CalibrationDocument>(json) {
            Ok(doc) => {
                self.apply(doc);
                info!(
                    "Imported calibration: offset {:.2}s, {} sync points",
                    self.global_offset_seconds,
                    self.sync_points.len()
                );
                true
            }
            Err(e) => {
                error!("Failed to import calibration: {}", e);
                false
            }
        }
    }
}
