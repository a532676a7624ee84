//! Transcript and chapter data model
//!
//! Loads the externally produced transcript document (word-level timestamps)
//! and the chapter boundary document, and converts them into the in-memory
//! forms the sync engine resolves against. Documents are produced once per
//! recording and immutable thereafter.
//!
//! Schema validation is deliberately shallow: optional fields default,
//! malformed chapter entries degrade to "chapter not found" lookups rather
//! than load failures.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// A word (or short span) with its position in the recording timeline
///
/// Units are ordered, non-overlapping, with non-decreasing `start`. Times
/// are transcript-domain seconds; the calibration offset is applied to the
/// player's raw time before any comparison against these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedUnit {
    /// Word text as it appears in the transcript
    pub text: String,
    /// Start of the spoken word (seconds)
    pub start: f64,
    /// End of the spoken word (seconds)
    pub end: f64,
    /// Position in the word sequence
    pub index: usize,
}

/// One word entry as it appears in the transcript JSON
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Transcript document: `{ "words": [...], "full_text": ..., "duration": ... }`
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptDocument {
    pub words: Vec<TranscriptWord>,
    #[serde(default)]
    pub full_text: Option<String>,
    /// Total recording duration in seconds, when the producer supplies it
    #[serde(default)]
    pub duration: Option<f64>,
}

impl TranscriptDocument {
    /// Convert the document's words into indexed [`TimedUnit`]s
    pub fn units(&self) -> Vec<TimedUnit> {
        self.words
            .iter()
            .enumerate()
            .map(|(index, w)| TimedUnit {
                text: w.word.clone(),
                start: w.start,
                end: w.end,
                index,
            })
            .collect()
    }

    /// Full text, reconstructed from the words when not supplied
    pub fn text(&self) -> String {
        match &self.full_text {
            Some(text) => text.clone(),
            None => {
                let words: Vec<&str> = self.words.iter().map(|w| w.word.as_str()).collect();
                words.join(" ")
            }
        }
    }
}

/// A named, contiguous time range partitioning the full recording
///
/// `end_word_index` is exclusive: the chapter's words are
/// `units[start_word_index..end_word_index]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: f64,
    pub end_time: f64,
    pub start_word_index: usize,
    pub end_word_index: usize,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub duration_minutes: f64,
}

impl Chapter {
    /// Slice the transcript down to this chapter's words
    ///
    /// Out-of-range indexes (a malformed chapter entry) clamp to the
    /// available words rather than panicking.
    pub fn words<'a>(&self, units: &'a [TimedUnit]) -> &'a [TimedUnit] {
        let start = self.start_word_index.min(units.len());
        let end = self.end_word_index.clamp(start, units.len());
        &units[start..end]
    }
}

/// Chapter document: book metadata plus the chapter table
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub narrator: Option<String>,
    #[serde(default)]
    pub chapter_count: usize,
    pub chapters: Vec<Chapter>,
}

/// Load a transcript document from disk
///
/// A missing or unparsable file surfaces as [`Error::Data`]: retryable by
/// the caller, never a panic.
pub async fn load_transcript(path: &Path) -> Result<TranscriptDocument> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Data(format!("Failed to read transcript {:?}: {}", path, e)))?;

    let doc: TranscriptDocument = serde_json::from_str(&content)
        .map_err(|e| Error::Data(format!("Failed to parse transcript {:?}: {}", path, e)))?;

    info!(
        "Loaded transcript: {} words, duration {:?}s",
        doc.words.len(),
        doc.duration
    );
    Ok(doc)
}

/// Load a chapter document from disk
pub async fn load_chapters(path: &Path) -> Result<ChapterDocument> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Data(format!("Failed to read chapters {:?}: {}", path, e)))?;

    let doc: ChapterDocument = serde_json::from_str(&content)
        .map_err(|e| Error::Data(format!("Failed to parse chapters {:?}: {}", path, e)))?;

    if doc.chapter_count != 0 && doc.chapter_count != doc.chapters.len() {
        warn!(
            "Chapter document declares {} chapters but contains {}",
            doc.chapter_count,
            doc.chapters.len()
        );
    }

    info!("Loaded {} chapters for {:?}", doc.chapters.len(), doc.title);
    Ok(doc)
}
