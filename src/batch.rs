//! Path-keyed upload queue with debounce state
//!
//! Holds at most one pending item per file (last write wins) and tracks
//! when the next flush is due. Every upsert pushes the deadline out again,
//! so a flush only happens after a quiet period.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

use crate::types::MemoryItem;

/// Default quiet period before a flush
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

/// Debounce timer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No flush scheduled
    Idle,
    /// Flush due at `deadline`
    Pending { deadline: Instant },
}

/// Pending items plus their debounce timer
#[derive(Debug)]
pub struct Batcher {
    pending: HashMap<PathBuf, MemoryItem>,
    state: DebounceState,
    debounce: Duration,
}

impl Batcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            state: DebounceState::Idle,
            debounce,
        }
    }

    /// Queue `item` for `path`, replacing any earlier item, and restart the timer.
    ///
    /// Returns true if an earlier item was replaced.
    pub fn upsert(&mut self, path: PathBuf, item: MemoryItem, now: Instant) -> bool {
        let replaced = self.pending.insert(path, item).is_some();
        self.state = DebounceState::Pending {
            deadline: now + self.debounce,
        };
        replaced
    }

    /// Drop the pending item for `path`. The timer keeps running.
    pub fn remove(&mut self, path: &Path) -> Option<MemoryItem> {
        self.pending.remove(path)
    }

    /// Drop every pending item below `dir`. Returns how many were dropped.
    pub fn remove_under(&mut self, dir: &Path) -> usize {
        let before = self.pending.len();
        self.pending.retain(|path, _| !path.starts_with(dir));
        before - self.pending.len()
    }

    /// Take every pending item and return to `Idle`
    pub fn take_batch(&mut self) -> Vec<MemoryItem> {
        self.state = DebounceState::Idle;
        self.pending.drain().map(|(_, item)| item).collect()
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { deadline } => Some(deadline),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&MemoryItem> {
        self.pending.get(path)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
