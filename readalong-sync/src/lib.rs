//! # Readalong Sync Service (readalong-sync)
//!
//! Audio/transcript time-alignment and highlighting engine.
//!
//! **Purpose:** Resolve the active word and chapter for an externally
//! hosted audiobook recording against an independently timed transcript,
//! compensate for drift with user-calibrated offsets, and expose the
//! engine over an HTTP/SSE control interface.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod sync;
pub mod transcript;

pub use error::{Error, Result};
pub use state::SharedState;
