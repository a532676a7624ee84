//! Event types for the Readalong event system
//!
//! Provides the shared event definitions and EventBus used by the sync
//! engine and the HTTP/SSE layer.
//!
//! Events are broadcast via EventBus and serialized for SSE transmission.
//! All events use one central enum for type safety and exhaustive matching.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Playback state of the external player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Readalong event types
///
/// Emitted by the sync engine as playback position ticks are processed and
/// calibration state changes. The SSE endpoint relays these to connected
/// clients verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Playback state changed (Playing ↔ Paused)
    PlaybackStateChanged {
        /// Playback state before change
        old_state: PlaybackState,
        /// Playback state after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback position update
    ///
    /// Emitted on every ingested tick. Carries both the raw player time and
    /// the offset-adjusted transcript time so clients never have to apply
    /// the calibration themselves.
    PositionUpdate {
        /// Raw player time (seconds)
        raw_time: f64,
        /// Offset-adjusted transcript time (seconds)
        adjusted_time: f64,
        /// Whether the player reported itself as playing
        is_playing: bool,
        /// When the tick was processed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active (highlighted) word changed
    ///
    /// Only emitted when the resolved word index actually differs from the
    /// previous resolution, so clients can repaint without de-duplicating.
    WordChanged {
        /// New active word index (None when playback precedes the transcript)
        word_index: Option<usize>,
        /// Text of the active word, when one is active
        text: Option<String>,
        /// Adjusted time the resolution was made at (seconds)
        adjusted_time: f64,
        /// When the change was detected
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback crossed a chapter boundary
    ChapterChanged {
        /// Index of the chapter now active
        chapter_index: usize,
        /// Chapter identifier from the chapter document
        chapter_id: String,
        /// Chapter title
        title: String,
        /// Progress through the chapter, 0-100
        progress_percent: f64,
        /// When the boundary crossing was detected
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Calibration state changed (offset slider, sync-point capture, import)
    CalibrationChanged {
        /// New global offset (seconds)
        global_offset_seconds: f64,
        /// New playback rate multiplier
        playback_rate: f64,
        /// Number of captured sync points
        sync_point_count: usize,
        /// When calibration changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl Event {
    /// Event type name used as the SSE `event:` field
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            Event::PositionUpdate { .. } => "PositionUpdate",
            Event::WordChanged { .. } => "WordChanged",
            Event::ChapterChanged { .. } => "ChapterChanged",
            Event::CalibrationChanged { .. } => "CalibrationChanged",
        }
    }
}

/// Broadcast bus carrying [`Event`]s to all subscribers
///
/// Thin wrapper over `tokio::sync::broadcast` so emitters do not need to
/// care whether anyone is listening.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Older events are dropped for lagging subscribers once the buffer
    /// fills; position updates are frequent and individually disposable.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if no subscribers are
    /// listening.
    pub fn emit(&self, event: Event) -> std::result::Result<usize, broadcast::error::SendError<Event>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscribers case
    ///
    /// The engine runs the same with or without SSE clients attached.
    pub fn emit_lossy(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event::PlaybackStateChanged {
            old_state: PlaybackState::Paused,
            new_state: PlaybackState::Playing,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_emit_no_subscribers() {
        let bus = EventBus::new(100);
        assert!(bus.emit(sample_event()).is_err());

        // Lossy emission must not panic without subscribers
        bus.emit_lossy(sample_event());
    }

    #[tokio::test]
    async fn test_emit_with_subscriber() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        assert!(bus.emit(sample_event()).is_ok());

        let received = rx.recv().await.unwrap();
        match received {
            Event::PlaybackStateChanged {
                old_state,
                new_state,
                ..
            } => {
                assert_eq!(old_state, PlaybackState::Paused);
                assert_eq!(new_state, PlaybackState::Playing);
            }
            _ => panic!("Wrong event type received"),
        }
    }

    #[test]
    fn test_event_serialization_tags_type() {
        let json = serde_json::to_value(&Event::WordChanged {
            word_index: Some(3),
            text: Some("memories".to_string()),
            adjusted_time: 12.5,
            timestamp: chrono::Utc::now(),
        })
        .unwrap();

        assert_eq!(json["type"], "WordChanged");
        assert_eq!(json["word_index"], 3);
        assert_eq!(json["text"], "memories");
    }

    #[test]
    fn test_type_name_matches_variant() {
        assert_eq!(sample_event().type_name(), "PlaybackStateChanged");
    }
}
