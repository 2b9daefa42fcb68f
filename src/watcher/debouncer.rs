//! Trailing-edge collapse of file change bursts.
//!
//! Saving, moving or scaffolding pages produces bursts of events. Every
//! qualifying event pushes the single deadline out by the debounce
//! duration; when the deadline passes, the whole burst yields one
//! regeneration, tagged with the most recent path.

use indexmap::IndexSet;
use tokio::time::{Duration, Instant};

use crate::store::ExclusionList;

#[derive(Debug)]
pub struct ChangeAggregator {
    /// Pending project-relative paths, most recent last.
    pending: IndexSet<String>,
    deadline: Option<Instant>,
    duration: Duration,
}

impl ChangeAggregator {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: IndexSet::new(),
            deadline: None,
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change at `now`. Excluded paths are dropped.
    ///
    /// Returns whether the path was accepted.
    pub fn record(&mut self, path: String, now: Instant, exclusions: &ExclusionList) -> bool {
        if exclusions.matches(&path) {
            return false;
        }

        // Re-recording a path makes it the most recent one
        self.pending.shift_remove(&path);
        self.pending.insert(path);
        self.deadline = Some(now + self.duration);
        true
    }

    /// When the pending burst settles, if anything is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the settled burst: its most recent path, clearing the rest.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                let last = self.pending.pop();
                self.pending.clear();
                last
            }
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
