//! Time-alignment and highlighting
//!
//! Maps playback positions from the external player onto the transcript's
//! word and chapter timelines, with user-driven calibration in between.

pub mod calibration;
pub mod chapters;
pub mod engine;
pub mod player;
pub mod timeline;

pub use calibration::{Calibration, CalibrationDocument, SyncPoint};
pub use chapters::ChapterTimeline;
pub use engine::{DriftReport, EngineStatus, SyncEngine};
pub use player::{
    seek_with_retry, PlaybackPosition, PlaybackSource, RemotePlayer, SimulatedPlayer,
};
pub use timeline::{WordTimeline, DEFAULT_TOLERANCE};
