//! Word timeline resolution
//!
//! Maps an offset-adjusted playback time to the active word in the
//! transcript. Resolution is sticky-forward: in the silence between two
//! words the earlier word stays active, and past the final word the final
//! word stays active, so the highlight never flickers off mid-playback.
//!
//! A leading tolerance window lets the first word light up slightly before
//! its nominal start, absorbing small timing error at the head of the
//! recording. Strict containment always wins over a neighbor's tolerance
//! window.

use crate::transcript::TimedUnit;

/// Default leading tolerance for word boundaries (seconds)
pub const DEFAULT_TOLERANCE: f64 = 0.2;

/// Word timeline for one transcript
///
/// Maintains the ordered word units and a cached active index so the
/// typical call (position advancing linearly within the same word or its
/// trailing gap) resolves in O(1); seeks fall back to a full scan.
#[derive(Debug, Clone)]
pub struct WordTimeline {
    /// Word units sorted by `start` ascending
    units: Vec<TimedUnit>,

    /// Leading tolerance applied before the first word's start (seconds)
    tolerance: f64,

    /// Cached result of the previous `advance()` call
    current: Option<usize>,

    /// Whether `advance()` has run at least once
    ///
    /// The first call never reports a change, matching the "result changes
    /// only when it differs from the previous call" contract.
    primed: bool,
}

impl WordTimeline {
    /// Create a word timeline with the default tolerance
    ///
    /// Units are sorted by `start` ascending in case the producer emitted
    /// them out of order.
    pub fn new(units: Vec<TimedUnit>) -> Self {
        Self::with_tolerance(units, DEFAULT_TOLERANCE)
    }

    /// Create a word timeline with an explicit tolerance
    pub fn with_tolerance(mut units: Vec<TimedUnit>, tolerance: f64) -> Self {
        units.sort_by(|a, b| a.start.total_cmp(&b.start));

        Self {
            units,
            tolerance,
            current: None,
            primed: false,
        }
    }

    /// Resolve the active word for an adjusted time (read-only)
    ///
    /// Resolution rules, in priority order:
    /// 1. Strict containment: `time ∈ [start, end]` of a unit wins outright,
    ///    so a neighbor's tolerance window can never steal a word that is
    ///    actually being spoken.
    /// 2. Gap stickiness: between `unit[i].end` and `unit[i+1].start` the
    ///    earlier unit stays active; likewise past the final unit's end.
    /// 3. Leading tolerance: up to `tolerance` seconds before the first
    ///    unit's start, the first unit is already active.
    /// 4. Earlier than that → `None` (playback has not reached the text).
    ///
    /// An empty timeline always resolves to `None`.
    pub fn resolve(&self, time: f64) -> Option<usize> {
        let first = self.units.first()?;

        if time < first.start {
            return if time >= first.start - self.tolerance {
                Some(0)
            } else {
                None
            };
        }

        for (i, unit) in self.units.iter().enumerate() {
            if time >= unit.start && time <= unit.end {
                return Some(i);
            }

            if time >= unit.end {
                match self.units.get(i + 1) {
                    // In the gap before the next word starts: stay here
                    Some(next) if time < next.start => return Some(i),
                    // Past the final word: the final word stays active
                    None => return Some(i),
                    _ => {}
                }
            }
        }

        // Unreachable for ordered units: once time >= first.start the
        // containment/gap cases partition the timeline.
        None
    }

    /// Advance the timeline to an adjusted time, updating the cached index
    ///
    /// Returns `(changed, active_index)`. `changed` is true only when the
    /// resolved index differs from the previous call's result; the first
    /// call never reports a change.
    pub fn advance(&mut self, time: f64) -> (bool, Option<usize>) {
        let resolved = match self.current {
            // HOT PATH: still inside the cached word or its trailing gap
            Some(i) if self.primed && self.owns(i, time) => Some(i),
            // COLD PATH: seek or boundary crossing, rescan
            _ => self.resolve(time),
        };

        let changed = self.primed && resolved != self.current;
        self.primed = true;
        self.current = resolved;
        (changed, resolved)
    }

    /// Force the cached active index (used by word/chapter jumps, which pin
    /// the highlight before the player's next tick confirms the position)
    ///
    /// Returns true when the forced index differs from the cached one.
    pub fn force(&mut self, index: Option<usize>) -> bool {
        let index = index.filter(|&i| i < self.units.len());
        let changed = self.primed && index != self.current;
        self.primed = true;
        self.current = index;
        changed
    }

    /// Cached active index from the most recent `advance()`/`force()`
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Whether unit `i` still owns `time`: inside the unit, or in the gap
    /// before the next unit starts (or past the end of the final unit)
    fn owns(&self, i: usize, time: f64) -> bool {
        let unit = &self.units[i];
        if time < unit.start {
            return false;
        }
        match self.units.get(i + 1) {
            Some(next) => time < next.start,
            None => true,
        }
    }

    /// Look up a unit by index
    pub fn unit(&self, index: usize) -> Option<&TimedUnit> {
        self.units.get(index)
    }

    /// All units in timeline order
    pub fn units(&self) -> &[TimedUnit] {
        &self.units
    }

    /// Configured leading tolerance (seconds)
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Number of units in the timeline
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the timeline is empty
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
