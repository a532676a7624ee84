//! Chapter boundary resolution
//!
//! Maps an offset-adjusted playback time to the chapter containing it and
//! detects boundary crossings. Chapters partition the recording into
//! contiguous `[start_time, end_time)` ranges; times before the first
//! chapter clamp to the first, times past the last clamp to the last, so a
//! lookup never comes back empty on a non-empty table.

use crate::transcript::Chapter;

/// Chapter timeline for one recording
///
/// Same cached-index scheme as the word timeline: the common case of the
/// position advancing within the current chapter is O(1).
#[derive(Debug, Clone)]
pub struct ChapterTimeline {
    /// Chapters sorted by `start_time` ascending
    chapters: Vec<Chapter>,

    /// Cached result of the previous `advance()` call
    current: Option<usize>,

    /// Whether `advance()` has run at least once
    primed: bool,
}

impl ChapterTimeline {
    /// Create a chapter timeline; chapters are sorted by start time
    pub fn new(mut chapters: Vec<Chapter>) -> Self {
        chapters.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        Self {
            chapters,
            current: None,
            primed: false,
        }
    }

    /// Resolve the chapter index for an adjusted time (read-only)
    ///
    /// Reverse scan for the last chapter whose start precedes the time.
    /// Within a partitioned table this is exactly `[start, end)`
    /// containment; across a malformed crack between chapters the earlier
    /// chapter stays active, keeping the resolved index monotonically
    /// non-decreasing in time. Empty table → `None`.
    pub fn resolve(&self, time: f64) -> Option<usize> {
        if self.chapters.is_empty() {
            return None;
        }

        for i in (0..self.chapters.len()).rev() {
            if time >= self.chapters[i].start_time {
                return Some(i);
            }
        }

        // Before every chapter: clamp to the first
        Some(0)
    }

    /// Advance to an adjusted time, updating the cached index
    ///
    /// Returns `(crossed_boundary, chapter_index)`; the first call never
    /// reports a crossing.
    pub fn advance(&mut self, time: f64) -> (bool, Option<usize>) {
        let resolved = match self.current {
            // HOT PATH: still inside the cached chapter's range
            Some(i) if self.primed && self.owns(i, time) => Some(i),
            _ => self.resolve(time),
        };

        let crossed = self.primed && resolved != self.current;
        self.primed = true;
        self.current = resolved;
        (crossed, resolved)
    }

    /// Whether chapter `i` still owns `time` under the reverse-scan rule:
    /// at or past its start, and before the next chapter's start (the first
    /// chapter also owns everything before its own start)
    fn owns(&self, i: usize, time: f64) -> bool {
        if time < self.chapters[i].start_time && i != 0 {
            return false;
        }
        match self.chapters.get(i + 1) {
            Some(next) => time < next.start_time,
            None => true,
        }
    }

    /// Progress through a chapter as a percentage, clamped to `[0, 100]`
    ///
    /// A degenerate chapter (non-positive duration) reports 0 rather than
    /// dividing by zero.
    pub fn progress_percent(&self, index: usize, time: f64) -> f64 {
        let Some(chapter) = self.chapters.get(index) else {
            return 0.0;
        };

        let duration = chapter.end_time - chapter.start_time;
        if duration <= 0.0 {
            return 0.0;
        }

        ((time - chapter.start_time) / duration * 100.0).clamp(0.0, 100.0)
    }

    /// Cached active index from the most recent `advance()`
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Look up a chapter by index
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    /// All chapters in timeline order
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Number of chapters
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
