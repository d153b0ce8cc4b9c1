//! Snapshot-based undo/redo history.
//!
//! The top of the undo stack is always the document's present state: history
//! is recorded after every mutation, and the initial state is recorded as the
//! first entry. Undo therefore never pops the last remaining entry.

use crate::config::MAX_UNDO_HISTORY;
use crate::snapshot::Snapshot;

/// Undo and redo stacks of whole-document snapshots.
#[derive(Debug, Clone)]
pub struct History {
    /// Past states, oldest first. The last entry is the current state.
    undo: Vec<Snapshot>,
    /// Undone states, the next redo last.
    redo: Vec<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    /// Create empty history keeping at most `limit` undo entries (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Create history whose single entry is `initial`.
    pub fn with_initial(initial: Snapshot, limit: usize) -> Self {
        let mut history = Self::new(limit);
        history.undo.push(initial);
        history
    }

    /// Push a new present state and forget everything that was undone.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.undo.push(snapshot);
        self.redo.clear();
        if self.undo.len() > self.limit {
            let excess = self.undo.len() - self.limit;
            self.undo.drain(..excess);
        }
    }

    /// Step back. Returns the state to restore, or `None` when only the
    /// present state is left.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.undo.len() < 2 {
            return None;
        }
        let popped = self.undo.pop()?;
        self.redo.push(popped);
        self.undo.last()
    }

    /// Step forward. Returns the state to restore, or `None` when nothing was undone.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let snapshot = self.redo.pop()?;
        self.undo.push(snapshot);
        self.undo.last()
    }

    /// Drop everything and start over from `initial`.
    pub fn reset(&mut self, initial: Snapshot) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push(initial);
    }

    /// The present state.
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo.last()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(background: &str) -> Snapshot {
        Snapshot::empty("5.2.4", background)
    }

    #[test]
    fn test_undo_keeps_one_entry() {
        let mut history = History::with_initial(snap("a"), 10);
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.current().unwrap().background(), "a");
    }

    #[test]
    fn test_empty_history_undo() {
        let mut history = History::new(10);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.current().is_none());
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::with_initial(snap("a"), 10);
        history.record(snap("b"));
        history.record(snap("c"));

        assert_eq!(history.undo().unwrap().background(), "b");
        assert_eq!(history.undo().unwrap().background(), "a");
        assert!(history.undo().is_none());
        assert_eq!(history.redo_len(), 2);

        assert_eq!(history.redo().unwrap().background(), "b");
        assert_eq!(history.redo().unwrap().background(), "c");
        assert!(history.redo().is_none());
        assert_eq!(history.undo_len(), 3);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::with_initial(snap("a"), 10);
        history.record(snap("b"));
        history.undo();
        assert!(history.can_redo());

        history.record(snap("c"));
        assert!(!history.can_redo());
        assert_eq!(history.current().unwrap().background(), "c");
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_initial(snap("0"), 3);
        for name in ["1", "2", "3", "4"] {
            history.record(snap(name));
        }
        assert_eq!(history.undo_len(), 3);
        assert_eq!(history.undo().unwrap().background(), "3");
        assert_eq!(history.undo().unwrap().background(), "2");
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_limit_never_below_one() {
        let mut history = History::new(0);
        assert_eq!(history.limit(), 1);
        history.record(snap("a"));
        history.record(snap("b"));
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.current().unwrap().background(), "b");
    }

    #[test]
    fn test_reset() {
        let mut history = History::with_initial(snap("a"), 10);
        history.record(snap("b"));
        history.undo();
        history.reset(snap("z"));
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.current().unwrap().background(), "z");
    }
}
