//! Sync engine
//!
//! Ties the word timeline, chapter table, and calibration state together.
//! The engine is driven by position ticks from the playback source; each
//! tick is adjusted by the calibration offset and resolved against both
//! timelines, and change events go out on the bus. Seeks, chapter jumps,
//! and word clicks update the local position optimistically; the player's
//! next tick confirms or corrects it.
//!
//! Everything here is synchronous computation over in-memory arrays; the
//! engine is locked only for the duration of one tick or command.

use std::sync::Arc;

use readalong_common::events::{Event, EventBus};
use readalong_common::time::format_position;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sync::calibration::{Calibration, CalibrationDocument, SyncPoint};
use crate::sync::chapters::ChapterTimeline;
use crate::sync::player::PlaybackPosition;
use crate::sync::timeline::WordTimeline;
use crate::transcript::{Chapter, TimedUnit};

/// Nominal spoken-word duration used for drift estimation (seconds)
const NOMINAL_WORD_SECONDS: f64 = 0.4;

/// Snapshot of the engine's resolved state, as served by the position API
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    /// Raw player time (seconds)
    pub raw_time: f64,
    /// Offset-adjusted transcript time (seconds)
    pub adjusted_time: f64,
    pub is_playing: bool,
    /// Active word, when playback has reached the transcript
    pub word_index: Option<usize>,
    pub word_text: Option<String>,
    /// Active chapter
    pub chapter_index: Option<usize>,
    pub chapter_id: Option<String>,
    pub chapter_title: Option<String>,
    /// Progress through the active chapter, 0-100
    pub chapter_progress_percent: f64,
    /// Adjusted time formatted as clock time for display
    pub position_display: String,
}

/// Expected-vs-actual word comparison for the calibration debug panel
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    /// Word the adjusted time resolves to
    pub expected_index: Option<usize>,
    /// Word currently highlighted (may have been pinned by a jump)
    pub actual_index: Option<usize>,
    /// Estimated drift in seconds (index delta × nominal word duration)
    pub drift_seconds: f64,
    /// Rough sync quality, 0-100
    pub accuracy_percent: f64,
}

/// The time-alignment and highlight engine
pub struct SyncEngine {
    words: WordTimeline,
    chapters: ChapterTimeline,
    calibration: Calibration,
    position: PlaybackPosition,
    events: Arc<EventBus>,
}

impl SyncEngine {
    pub fn new(units: Vec<TimedUnit>, chapters: Vec<Chapter>, events: Arc<EventBus>) -> Self {
        info!(
            "Sync engine initialized: {} words, {} chapters",
            units.len(),
            chapters.len()
        );

        Self {
            words: WordTimeline::new(units),
            chapters: ChapterTimeline::new(chapters),
            calibration: Calibration::new(),
            position: PlaybackPosition {
                current_time: 0.0,
                is_playing: false,
            },
            events,
        }
    }

    // ------------------------------------------------------------------
    // Tick ingestion
    // ------------------------------------------------------------------

    /// Process one position tick from the playback source
    ///
    /// Ticks normally arrive in non-decreasing time order, but a seek is
    /// just a new time through the same path; a stale tick arriving right
    /// after a programmatic seek briefly rewinds the optimistic position
    /// and the following tick corrects it.
    pub fn handle_tick(&mut self, position: PlaybackPosition) {
        let old_state = self.position.state();
        let new_state = position.state();
        if old_state != new_state {
            self.events.emit_lossy(Event::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: chrono::Utc::now(),
            });
        }

        self.position = position;
        self.resolve_at(position.current_time);
    }

    /// Resolve both timelines at a raw time and emit change events
    fn resolve_at(&mut self, raw_time: f64) {
        let adjusted = self.calibration.adjust(raw_time);

        let (word_changed, word_index) = self.words.advance(adjusted);
        if word_changed {
            self.emit_word_changed(word_index, adjusted);
        }

        let (crossed, chapter_index) = self.chapters.advance(adjusted);
        if crossed {
            self.emit_chapter_changed(chapter_index, adjusted);
        }

        self.events.emit_lossy(Event::PositionUpdate {
            raw_time,
            adjusted_time: adjusted,
            is_playing: self.position.is_playing,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit_word_changed(&self, word_index: Option<usize>, adjusted: f64) {
        let text = word_index
            .and_then(|i| self.words.unit(i))
            .map(|u| u.text.clone());
        self.events.emit_lossy(Event::WordChanged {
            word_index,
            text,
            adjusted_time: adjusted,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit_chapter_changed(&self, chapter_index: Option<usize>, adjusted: f64) {
        let Some(index) = chapter_index else { return };
        let Some(chapter) = self.chapters.chapter(index) else {
            return;
        };
        self.events.emit_lossy(Event::ChapterChanged {
            chapter_index: index,
            chapter_id: chapter.id.clone(),
            title: chapter.title.clone(),
            progress_percent: self.chapters.progress_percent(index, adjusted),
            timestamp: chrono::Utc::now(),
        });
    }

    // ------------------------------------------------------------------
    // Seeking
    // ------------------------------------------------------------------

    /// Prepare a seek to an adjusted (transcript-domain) time
    ///
    /// Applies the optimistic position update and returns the raw target
    /// to deliver to the player (the player speaks raw time). Repeating
    /// the same target is a no-op beyond redundant assignment.
    pub fn prepare_seek(&mut self, adjusted_target: f64) -> f64 {
        let raw = self.calibration.to_raw(adjusted_target);
        debug!(
            "Seek to adjusted {:.2}s (raw {:.2}s)",
            adjusted_target, raw
        );
        self.position.current_time = raw;
        self.resolve_at(raw);
        raw
    }

    /// Prepare a seek to a word's start time, pinning the highlight to it
    ///
    /// Returns the raw target for the player.
    pub fn prepare_word_seek(&mut self, word_index: usize) -> Result<f64> {
        let unit = self
            .words
            .unit(word_index)
            .ok_or_else(|| Error::NotFound(format!("word index {}", word_index)))?;
        let target = unit.start;

        let raw = self.calibration.to_raw(target);
        self.position.current_time = raw;

        if self.words.force(Some(word_index)) {
            self.emit_word_changed(Some(word_index), target);
        }
        let (crossed, chapter_index) = self.chapters.advance(target);
        if crossed {
            self.emit_chapter_changed(chapter_index, target);
        }
        self.events.emit_lossy(Event::PositionUpdate {
            raw_time: raw,
            adjusted_time: target,
            is_playing: self.position.is_playing,
            timestamp: chrono::Utc::now(),
        });

        Ok(raw)
    }

    /// Prepare a jump to a chapter's start, pinning the highlight to the
    /// chapter's first word
    ///
    /// Returns the raw target for the player.
    pub fn prepare_chapter_jump(&mut self, chapter_index: usize) -> Result<f64> {
        let chapter = self
            .chapters
            .chapter(chapter_index)
            .ok_or_else(|| Error::NotFound(format!("chapter index {}", chapter_index)))?;
        let target = chapter.start_time;
        let first_word = chapter.start_word_index;
        info!("Jump to chapter {} at {:.2}s", chapter.title, target);

        let raw = self.calibration.to_raw(target);
        self.position.current_time = raw;

        let (crossed, new_index) = self.chapters.advance(target);
        if crossed {
            self.emit_chapter_changed(new_index, target);
        }
        if self.words.force(Some(first_word)) {
            self.emit_word_changed(self.words.current(), target);
        }
        self.events.emit_lossy(Event::PositionUpdate {
            raw_time: raw,
            adjusted_time: target,
            is_playing: self.position.is_playing,
            timestamp: chrono::Utc::now(),
        });

        Ok(raw)
    }

    /// Chapter adjacent to the active one (`forward` = next, else previous)
    pub fn adjacent_chapter(&self, forward: bool) -> Option<usize> {
        let current = self
            .chapters
            .current()
            .or_else(|| self.chapters.resolve(self.adjusted_time()))?;
        if forward {
            let next = current + 1;
            (next < self.chapters.len()).then_some(next)
        } else {
            current.checked_sub(1)
        }
    }

    // ------------------------------------------------------------------
    // Calibration
    // ------------------------------------------------------------------

    /// Capture a sync point: the user heard `word_index` being spoken at
    /// the current raw player time
    pub fn capture_sync_point(&mut self, word_index: usize) -> Result<SyncPoint> {
        let unit = self
            .words
            .unit(word_index)
            .ok_or_else(|| Error::NotFound(format!("word index {}", word_index)))?;
        let expected = unit.start;
        let text = unit.text.clone();

        let point = self
            .calibration
            .capture(expected, self.position.current_time, &text);
        self.emit_calibration_changed();
        Ok(point)
    }

    /// Recompute the offset from all captured sync points
    pub fn derive_offset(&mut self) -> Option<f64> {
        let derived = self.calibration.derive_offset();
        if derived.is_some() {
            self.emit_calibration_changed();
        }
        derived
    }

    pub fn set_offset(&mut self, offset_seconds: f64) {
        self.calibration.set_offset(offset_seconds);
        self.emit_calibration_changed();
    }

    /// Set the playback rate; returns the clamped rate so the caller can
    /// propagate it to the player
    pub fn set_rate(&mut self, rate: f64) -> f64 {
        self.calibration.set_rate(rate);
        self.emit_calibration_changed();
        self.calibration.playback_rate()
    }

    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
        self.emit_calibration_changed();
    }

    /// Import calibration JSON; malformed input keeps the prior state
    pub fn import_calibration(&mut self, json: &str) -> bool {
        let ok = self.calibration.import_json(json);
        if ok {
            self.emit_calibration_changed();
        }
        ok
    }

    pub fn export_calibration(&self) -> CalibrationDocument {
        self.calibration.export()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    fn emit_calibration_changed(&self) {
        self.events.emit_lossy(Event::CalibrationChanged {
            global_offset_seconds: self.calibration.global_offset_seconds(),
            playback_rate: self.calibration.playback_rate(),
            sync_point_count: self.calibration.sync_points().len(),
            timestamp: chrono::Utc::now(),
        });
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    pub fn adjusted_time(&self) -> f64 {
        self.calibration.adjust(self.position.current_time)
    }

    pub fn words(&self) -> &WordTimeline {
        &self.words
    }

    pub fn chapters(&self) -> &ChapterTimeline {
        &self.chapters
    }

    /// Current resolved state for the position API
    pub fn status(&self) -> EngineStatus {
        let adjusted = self.adjusted_time();
        let word_index = self.words.current();
        let chapter_index = self.chapters.current().or_else(|| self.chapters.resolve(adjusted));
        let chapter = chapter_index.and_then(|i| self.chapters.chapter(i));

        EngineStatus {
            raw_time: self.position.current_time,
            adjusted_time: adjusted,
            is_playing: self.position.is_playing,
            word_index,
            word_text: word_index
                .and_then(|i| self.words.unit(i))
                .map(|u| u.text.clone()),
            chapter_index,
            chapter_id: chapter.map(|c| c.id.clone()),
            chapter_title: chapter.map(|c| c.title.clone()),
            chapter_progress_percent: chapter_index
                .map(|i| self.chapters.progress_percent(i, adjusted))
                .unwrap_or(0.0),
            position_display: format_position(adjusted),
        }
    }

    /// Expected-vs-actual word comparison at the current position
    pub fn drift_report(&self) -> DriftReport {
        let expected_index = self.words.resolve(self.adjusted_time());
        let actual_index = self.words.current();

        let drift_seconds = match (expected_index, actual_index) {
            (Some(e), Some(a)) => (a as f64 - e as f64) * NOMINAL_WORD_SECONDS,
            _ => 0.0,
        };
        let accuracy_percent = (100.0 - drift_seconds.abs() * 10.0).clamp(0.0, 100.0);

        DriftReport {
            expected_index,
            actual_index,
            drift_seconds,
            accuracy_percent,
        }
    }
}
