//! Deadline-based debouncing for editor input.
//!
//! There are no timer threads. A [`Debouncer`] records a deadline when a value
//! arrives and the owning event loop polls it; a later value before the
//! deadline replaces the pending one and restarts the window.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Default quiet interval before an edit is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Cell::new(Instant::now()) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Debounce-and-dedupe state for one input stream.
///
/// A value is committed once input has been quiet for `window`, and only if
/// it differs from the last committed value. With a zero window values are
/// committed straight from [`push`](Self::push).
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    last_committed: Option<T>,
    pending: Option<Pending<T>>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self { window, last_committed: None, pending: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a new value at `now`.
    ///
    /// Returns the value when the window is zero and it passes dedupe.
    pub fn push(&mut self, value: T, now: Instant) -> Option<T> {
        if self.last_committed.as_ref() == Some(&value) {
            // Edited back to what is already committed.
            self.pending = None;
            return None;
        }
        if self.window.is_zero() {
            self.pending = None;
            return Some(self.commit(value));
        }
        self.pending = Some(Pending { value, deadline: now + self.window });
        None
    }

    /// Commits the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref().is_some_and(|p| p.deadline <= now);
        if due { self.flush() } else { None }
    }

    /// Commits the pending value regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        Some(self.commit(pending.value))
    }

    /// Drops the pending value without committing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Treats `value` as already committed, without emitting it.
    pub fn prime(&mut self, value: T) {
        self.pending = None;
        self.last_committed = Some(value);
    }

    /// Forgets both the pending and the last committed value.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_committed = None;
    }

    /// The newest value not yet committed.
    pub fn pending_value(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    fn commit(&mut self, value: T) -> T {
        self.last_committed = Some(value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn test_rapid_values_commit_once_with_last_value() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(WINDOW);
        let mut committed = Vec::new();

        for title in ["M", "My", "My ", "My N", "My Notes"] {
            d.push(title.to_string(), clock.now());
            clock.advance(Duration::from_millis(100));
            committed.extend(d.poll(clock.now()));
        }
        clock.advance(WINDOW);
        committed.extend(d.poll(clock.now()));

        assert_eq!(committed, vec!["My Notes".to_string()]);
        assert!(d.is_idle());
    }

    #[test]
    fn test_window_restarts_on_each_value() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(WINDOW);

        d.push(1, clock.now());
        clock.advance(Duration::from_millis(400));
        d.push(2, clock.now());
        clock.advance(Duration::from_millis(400));
        assert_eq!(d.poll(clock.now()), None);

        clock.advance(Duration::from_millis(100));
        assert_eq!(d.poll(clock.now()), Some(2));
    }

    #[test]
    fn test_identical_value_is_not_recommitted() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(WINDOW);

        d.push("a", clock.now());
        clock.advance(WINDOW);
        assert_eq!(d.poll(clock.now()), Some("a"));

        d.push("a", clock.now());
        clock.advance(WINDOW);
        assert_eq!(d.poll(clock.now()), None);
    }

    #[test]
    fn test_edit_back_to_committed_value_cancels_pending() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(WINDOW);
        d.push("a", clock.now());
        assert_eq!(d.flush(), Some("a"));

        d.push("ab", clock.now());
        d.push("a", clock.now());
        clock.advance(WINDOW);
        assert_eq!(d.poll(clock.now()), None);
    }

    #[test]
    fn test_zero_window_forwards_after_dedupe() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(Duration::ZERO);

        assert_eq!(d.push("x", clock.now()), Some("x"));
        assert_eq!(d.push("x", clock.now()), None);
        assert_eq!(d.push("y", clock.now()), Some("y"));
    }

    #[test]
    fn test_cancel_drops_pending_value() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(WINDOW);
        d.push(5, clock.now());
        d.cancel();
        clock.advance(WINDOW);
        assert_eq!(d.poll(clock.now()), None);
    }

    #[test]
    fn test_primed_value_is_treated_as_committed() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(WINDOW);
        d.prime("current title");

        d.push("current title", clock.now());
        assert!(d.is_idle());
    }

    #[test]
    fn test_reset_forgets_last_committed() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(WINDOW);
        d.push("same", clock.now());
        d.flush();

        d.reset();
        d.push("same", clock.now());
        assert_eq!(d.pending_value(), Some(&"same"));
        assert_eq!(d.next_deadline(), Some(clock.now() + WINDOW));
    }
}
