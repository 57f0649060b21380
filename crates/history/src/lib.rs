use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

mod clock;
pub use clock::*;
mod coalesce;
pub use coalesce::*;

/// Undo entries kept unless a capacity is given explicitly.
pub const MAX_HISTORY_SIZE: usize = 25;

/// Bounded undo/redo over snapshots of a value.
///
/// `past` is oldest-first and never holds more than `capacity` entries;
/// `future` is nearest-first. Committing a value equal to the present is a
/// no-op, so repeated identical commits never grow the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredHistory<T>")]
pub struct History<T> {
    past: VecDeque<T>,
    present: T,
    future: VecDeque<T>,
    capacity: usize,
}

/// Persisted form of [`History`], checked on the way in.
#[derive(Deserialize)]
struct StoredHistory<T> {
    #[serde(default = "VecDeque::new")]
    past: VecDeque<T>,
    present: T,
    #[serde(default = "VecDeque::new")]
    future: VecDeque<T>,
    #[serde(default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    MAX_HISTORY_SIZE
}

impl<T> From<StoredHistory<T>> for History<T> {
    /// Raises a zero capacity to one and drops entries beyond it, oldest
    /// undo entries and farthest redo entries first.
    fn from(stored: StoredHistory<T>) -> Self {
        let StoredHistory {
            mut past,
            present,
            mut future,
            capacity,
        } = stored;
        let capacity = capacity.max(1);
        let dropped = past.len().saturating_sub(capacity) + future.len().saturating_sub(capacity);
        while past.len() > capacity {
            past.pop_front();
        }
        future.truncate(capacity);
        if dropped > 0 {
            debug!(dropped, capacity, "trimmed stored history");
        }
        Self {
            past,
            present,
            future,
            capacity,
        }
    }
}

impl<T: Clone + PartialEq> History<T> {
    pub fn new(initial: T) -> Self {
        Self::with_capacity(initial, MAX_HISTORY_SIZE)
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(initial: T, capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns `false` when `value` equals the present and nothing changed.
    pub fn commit(&mut self, value: T) -> bool {
        if value == self.present {
            return false;
        }
        let previous = std::mem::replace(&mut self.present, value);
        self.push_past(previous);
        self.future.clear();
        debug!(past = self.past.len(), "history commit");
        true
    }

    /// Commit the result of editing a copy of the present.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> bool {
        let mut next = self.present.clone();
        edit(&mut next);
        self.commit(next)
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        debug!(past = self.past.len(), future = self.future.len(), "history undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.push_past(current);
        debug!(past = self.past.len(), future = self.future.len(), "history redo");
        true
    }

    /// Drop all undo and redo entries, optionally resetting the present.
    pub fn clear(&mut self, reset: Option<T>) {
        self.past.clear();
        self.future.clear();
        if let Some(value) = reset {
            self.present = value;
        }
    }

    fn push_past(&mut self, value: T) {
        self.past.push_back(value);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
    }
}

impl<T> History<T> {
    pub fn present(&self) -> &T {
        &self.present
    }

    pub fn past(&self) -> impl Iterator<Item = &T> {
        self.past.iter()
    }

    pub fn future(&self) -> impl Iterator<Item = &T> {
        self.future.iter()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    /// Past entries, the present, and future entries.
    pub fn size(&self) -> usize {
        self.past.len() + 1 + self.future.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn into_present(self) -> T {
        self.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_undo_redo() {
        let mut history = History::new(0);
        assert!(history.commit(1));
        assert!(history.commit(2));
        assert_eq!(history.size(), 3);

        assert!(history.undo());
        assert_eq!(*history.present(), 1);
        assert!(history.can_redo());

        assert!(history.redo());
        assert_eq!(*history.present(), 2);
        assert!(!history.redo());
    }

    #[test]
    fn test_identical_commit_is_noop() {
        let mut history = History::new("a".to_string());
        history.commit("b".to_string());
        history.undo();
        assert!(!history.commit("a".to_string()));
        // the redo branch survives an identical commit
        assert!(history.can_redo());
        assert_eq!(history.size(), 2);
    }

    #[test]
    fn test_empty_history_noops() {
        let mut history = History::new(5);
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(*history.present(), 5);
        assert_eq!(history.size(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::with_capacity(0, 3);
        for v in 1..=5 {
            history.commit(v);
        }
        assert_eq!(history.past().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = History::with_capacity(0, 0);
        history.commit(1);
        assert_eq!(history.capacity(), 1);
        assert!(history.undo());
        assert_eq!(*history.present(), 0);
    }

    #[test]
    fn test_clear_with_and_without_reset() {
        let mut history = History::new(0);
        history.commit(1);
        history.commit(2);
        history.undo();

        history.clear(None);
        assert_eq!(*history.present(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        history.commit(3);
        history.clear(Some(10));
        assert_eq!(*history.present(), 10);
        assert_eq!(history.size(), 1);
    }

    #[test]
    fn test_update_edits_copy() {
        let mut history = History::new(vec![1]);
        assert!(history.update(|v| v.push(2)));
        assert!(!history.update(|_| {}));
        assert_eq!(history.present(), &vec![1, 2]);
        history.undo();
        assert_eq!(history.present(), &vec![1]);
    }
}
