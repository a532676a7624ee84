//! # Readalong Common Library
//!
//! Shared code for the Readalong sync service including:
//! - Event types (Event enum) and the EventBus
//! - Error types
//! - Configuration loading
//! - Timestamp and position formatting utilities

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{Event, EventBus, PlaybackState};
