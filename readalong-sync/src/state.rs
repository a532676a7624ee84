//! Shared service state
//!
//! Thread-safe shared state handed to every API handler and the simulated
//! tick task. The engine sits behind an RwLock; writes are short (one tick
//! or one command), reads serve the status endpoints.

use std::sync::Arc;

use readalong_common::events::{Event, EventBus};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::sync::{PlaybackSource, SyncEngine};

/// Book metadata shown by the API, taken from the loaded documents
#[derive(Debug, Clone, Serialize)]
pub struct BookInfo {
    pub title: String,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub chapter_count: usize,
    pub word_count: usize,
    /// Recording duration in seconds, when the transcript supplies it
    pub duration: Option<f64>,
}

/// Shared state accessible by all components
pub struct SharedState {
    /// The alignment engine
    pub engine: RwLock<SyncEngine>,

    /// Playback source commanded by seek endpoints
    pub player: Arc<dyn PlaybackSource>,

    /// Event broadcaster for SSE
    pub events: Arc<EventBus>,

    /// Metadata for the loaded book
    pub book: BookInfo,
}

impl SharedState {
    pub fn new(
        engine: SyncEngine,
        player: Arc<dyn PlaybackSource>,
        events: Arc<EventBus>,
        book: BookInfo,
    ) -> Self {
        Self {
            engine: RwLock::new(engine),
            player,
            events,
            book,
        }
    }

    /// Subscribe to the engine's event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}
