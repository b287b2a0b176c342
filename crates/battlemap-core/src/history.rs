//! Bounded undo/redo history of scene snapshots.

use crate::scene::{Asset, Drawing, Token};
use std::sync::Arc;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Immutable copy of the historized collections.
///
/// Weather and view are deliberately not part of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub drawings: Arc<Vec<Drawing>>,
    pub assets: Arc<Vec<Asset>>,
    pub tokens: Arc<Vec<Token>>,
}

/// Linear history with a cursor.
///
/// Each entry is the state *after* a mutation. The optional base is the
/// state before the oldest entry, so every recorded edit can be undone.
/// Pushing drops every entry past the cursor (no redo branches) and evicts
/// the oldest entry once the capacity is exceeded; the evicted state
/// becomes the new base.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<SceneSnapshot>,
    base: Option<SceneSnapshot>,
    /// Number of entries currently applied; 0 means the base.
    position: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history keeping at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            base: None,
            position: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of recorded edits. The base is not counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the current entry, `None` at the base.
    pub fn index(&self) -> Option<usize> {
        self.position.checked_sub(1)
    }

    pub fn base(&self) -> Option<&SceneSnapshot> {
        self.base.as_ref()
    }

    /// Record a new state.
    pub fn push(&mut self, snapshot: SceneSnapshot) {
        self.entries.truncate(self.position);
        self.entries.push(snapshot);
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.base = self.entries.drain(..overflow).last();
        }
        self.position = self.entries.len();
    }

    pub fn can_undo(&self) -> bool {
        self.position > 1 || (self.position == 1 && self.base.is_some())
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    /// Step back and return the state to restore.
    pub fn undo(&mut self) -> Option<&SceneSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.position -= 1;
        match self.position {
            0 => self.base.as_ref(),
            n => self.entries.get(n - 1),
        }
    }

    /// Step forward and return the state to restore.
    pub fn redo(&mut self) -> Option<&SceneSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.position += 1;
        self.entries.get(self.position - 1)
    }

    /// Drop every entry and the base.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.base = None;
        self.position = 0;
    }

    /// Drop every entry and start over from `base`.
    pub fn reset(&mut self, base: SceneSnapshot) {
        self.clear();
        self.base = Some(base);
    }
}
