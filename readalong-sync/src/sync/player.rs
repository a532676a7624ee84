//! Playback source abstraction
//!
//! The engine never decodes audio; it speaks to an external player through
//! this seam. Two implementations:
//!
//! - [`RemotePlayer`]: the production case, where an external client
//!   (browser page, embedded video player) pushes position ticks over the
//!   API and executes seeks on its side.
//! - [`SimulatedPlayer`]: demo and test mode, a local clock advanced on a
//!   fixed one-second tick honoring the calibration playback rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error};

use readalong_common::events::PlaybackState;

/// Position report from the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    /// Raw player time (seconds)
    pub current_time: f64,
    /// Whether the player is currently playing
    pub is_playing: bool,
}

impl PlaybackPosition {
    pub fn state(&self) -> PlaybackState {
        if self.is_playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }
}

/// External player contract
///
/// `seek_to` returns a success indicator rather than an error: a seek that
/// cannot be delivered degrades to stale highlighting, it is never fatal.
pub trait PlaybackSource: Send + Sync {
    /// Whether the player is initialized and able to accept commands
    fn is_ready(&self) -> bool;

    /// Command the player to the given raw time; true on success
    fn seek_to(&self, raw_time: f64) -> bool;

    /// Propagate a playback-rate change to the player
    fn set_rate(&self, rate: f64);

    /// Called when a position tick from this player is ingested
    fn notice_tick(&self) {}
}

/// Seek attempts before giving up on a not-ready player
pub const SEEK_ATTEMPTS: u32 = 3;

/// Fixed delay between seek attempts
pub const SEEK_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Deliver a seek to the player, retrying while it is not ready
///
/// Up to [`SEEK_ATTEMPTS`] tries with a fixed [`SEEK_RETRY_DELAY`] between
/// them, then silent give-up with a diagnostic. The engine's optimistic
/// position update has already happened by the time this runs, so a failed
/// delivery only means the player was never moved.
pub async fn seek_with_retry(player: &dyn PlaybackSource, raw_time: f64) -> bool {
    for attempt in 1..=SEEK_ATTEMPTS {
        if player.is_ready() {
            let ok = player.seek_to(raw_time);
            debug!(
                "Seek to {:.2}s on attempt {}: {}",
                raw_time,
                attempt,
                if ok { "ok" } else { "refused" }
            );
            return ok;
        }

        if attempt < SEEK_ATTEMPTS {
            debug!(
                "Player not ready, retrying seek ({}/{})",
                attempt, SEEK_ATTEMPTS
            );
            tokio::time::sleep(SEEK_RETRY_DELAY).await;
        }
    }

    error!(
        "Seek to {:.2}s failed after {} attempts: player not ready",
        raw_time, SEEK_ATTEMPTS
    );
    false
}

/// Stand-in for an external player driven over the API
///
/// Readiness is inferred from traffic: the player counts as initialized
/// once it has reported at least one position tick. Seek commands are
/// acknowledged and logged; the external client observes the engine's
/// optimistic position (via the position endpoint or SSE) and corrects
/// with its next tick.
#[derive(Debug, Default)]
pub struct RemotePlayer {
    ready: AtomicBool,
}

impl RemotePlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackSource for RemotePlayer {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn seek_to(&self, raw_time: f64) -> bool {
        if !self.is_ready() {
            return false;
        }
        debug!("Remote player seek acknowledged at {:.2}s", raw_time);
        true
    }

    fn set_rate(&self, rate: f64) {
        debug!("Remote player rate set to {:.2}x", rate);
    }

    fn notice_tick(&self) {
        self.ready.store(true, Ordering::Relaxed);
    }
}

/// Simulated player state behind the mutex
#[derive(Debug, Clone, Copy)]
struct SimulatedState {
    current_time: f64,
    is_playing: bool,
    rate: f64,
}

/// Local simulated player for demo mode and tests
///
/// Advances its clock by `dt * rate` per tick while playing. Always ready.
#[derive(Debug)]
pub struct SimulatedPlayer {
    state: Mutex<SimulatedState>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                current_time: 0.0,
                is_playing: false,
                rate: 1.0,
            }),
        }
    }

    /// Advance the simulated clock by `dt` wall seconds
    ///
    /// Returns the position after the tick.
    pub fn tick(&self, dt: f64) -> PlaybackPosition {
        let mut state = self.state.lock().unwrap();
        if state.is_playing {
            state.current_time += dt * state.rate;
        }
        PlaybackPosition {
            current_time: state.current_time,
            is_playing: state.is_playing,
        }
    }

    pub fn play(&self) {
        self.state.lock().unwrap().is_playing = true;
    }

    pub fn pause(&self) {
        self.state.lock().unwrap().is_playing = false;
    }

    pub fn position(&self) -> PlaybackPosition {
        let state = self.state.lock().unwrap();
        PlaybackPosition {
            current_time: state.current_time,
            is_playing: state.is_playing,
        }
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSource for SimulatedPlayer {
    fn is_ready(&self) -> bool {
        true
    }

    fn seek_to(&self, raw_time: f64) -> bool {
        self.state.lock().unwrap().current_time = raw_time.max(0.0);
        true
    }

    fn set_rate(&self, rate: f64) {
        self.state.lock().unwrap().rate = rate;
    }
}
