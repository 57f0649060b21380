use std::time::{Duration, Instant};
use tracing::debug;

use crate::{Clock, History, SystemClock};

/// Default window in which rapid commits merge into one entry.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// History driven by rapid input such as keystrokes.
///
/// Commits within `window` of each other coalesce: only the last value is
/// recorded, once the window has elapsed since the latest commit and the
/// owner calls [`poll`](Self::poll). Dropping the wrapper discards a pending
/// value; call [`flush`](Self::flush) first to keep it.
#[derive(Debug)]
pub struct CoalescingHistory<T, C = SystemClock> {
    history: History<T>,
    pending: Option<Pending<T>>,
    window: Duration,
    clock: C,
}

impl<T: Clone + PartialEq> CoalescingHistory<T, SystemClock> {
    pub fn new(history: History<T>, window: Duration) -> Self {
        Self::with_clock(history, window, SystemClock)
    }
}

impl<T: Clone + PartialEq, C: Clock> CoalescingHistory<T, C> {
    pub fn with_clock(history: History<T>, window: Duration, clock: C) -> Self {
        Self {
            history,
            pending: None,
            window,
            clock,
        }
    }

    /// Schedule `value`, replacing any pending value and restarting the window.
    pub fn commit(&mut self, value: T) {
        let deadline = self.clock.now() + self.window;
        if self.pending.is_some() {
            debug!("coalescing pending commit");
        }
        self.pending = Some(Pending { value, deadline });
    }

    /// Apply the pending value if its window has elapsed.
    pub fn poll(&mut self) -> bool {
        match &self.pending {
            Some(pending) if self.clock.now() >= pending.deadline => self.flush(),
            _ => false,
        }
    }

    /// Apply the pending value now. Returns whether the history changed.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => self.history.commit(pending.value),
            None => false,
        }
    }

    /// Discard the pending value without recording it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.value)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Undo acts on recorded history; a pending value is discarded first.
    pub fn undo(&mut self) -> bool {
        self.cancel();
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.cancel();
        self.history.redo()
    }

    pub fn clear(&mut self, reset: Option<T>) {
        self.cancel();
        self.history.clear(reset);
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<T, C> CoalescingHistory<T, C> {
    /// Last recorded value; a pending value is not visible here.
    pub fn present(&self) -> &T {
        self.history.present()
    }

    pub fn history(&self) -> &History<T> {
        &self.history
    }

    /// Unwrap the recorded history, discarding any pending value.
    pub fn into_history(self) -> History<T> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn coalescing(initial: &str) -> (CoalescingHistory<String, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let history = CoalescingHistory::with_clock(
            History::new(initial.to_string()),
            DEFAULT_DEBOUNCE,
            clock.clone(),
        );
        (history, clock)
    }

    #[test]
    fn test_keystrokes_coalesce_into_one_entry() {
        let (mut history, clock) = coalescing("");
        for text in ["c", "ca", "cat"] {
            history.commit(text.to_string());
            clock.advance(Duration::from_millis(50));
            assert!(!history.poll());
        }
        clock.advance(Duration::from_millis(100));
        assert!(history.poll());
        assert_eq!(history.present(), "cat");
        assert_eq!(history.history().size(), 2);
    }

    #[test]
    fn test_window_restarts_on_each_commit() {
        let (mut history, clock) = coalescing("");
        history.commit("a".to_string());
        clock.advance(Duration::from_millis(140));
        history.commit("ab".to_string());
        clock.advance(Duration::from_millis(140));
        assert!(!history.poll());
        clock.advance(Duration::from_millis(10));
        assert!(history.poll());
        assert_eq!(history.present(), "ab");
    }

    #[test]
    fn test_cancel_discards_pending() {
        let (mut history, clock) = coalescing("x");
        history.commit("y".to_string());
        assert_eq!(history.cancel().as_deref(), Some("y"));
        clock.advance(Duration::from_secs(1));
        assert!(!history.poll());
        assert_eq!(history.present(), "x");
        assert!(history.next_deadline().is_none());
    }

    #[test]
    fn test_flush_applies_immediately() {
        let (mut history, _clock) = coalescing("x");
        history.commit("y".to_string());
        assert_eq!(history.pending().map(String::as_str), Some("y"));
        assert!(history.flush());
        assert_eq!(history.present(), "y");
        assert!(!history.has_pending());
    }

    #[test]
    fn test_undo_drops_pending_value() {
        let (mut history, _clock) = coalescing("a");
        history.commit("b".to_string());
        history.flush();
        history.commit("c".to_string());
        assert!(history.undo());
        assert_eq!(history.present(), "a");
        assert!(!history.has_pending());
    }
}
