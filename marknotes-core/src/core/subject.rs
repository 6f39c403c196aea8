//! Observable values with replay-latest semantics.
//!
//! A [`Subject`] owns its current value. Observers are called synchronously,
//! in registration order, every time a new value is published, and once with
//! the current value at the moment they subscribe.
//!
//! Subjects are single-threaded: clones share state through `Rc`, and an
//! observer may read the subject or subscribe new observers from inside a
//! notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Observer<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Inner<T> {
    value: RefCell<T>,
    observers: RefCell<Vec<(u64, Observer<T>)>>,
    next_id: Cell<u64>,
}

/// A mutable cell that broadcasts every change to its observers.
pub struct Subject<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: fmt::Debug> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("value", &self.inner.value.borrow())
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(initial),
                observers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Registers `observer` and immediately replays the current value to it.
    ///
    /// The observer stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes the observer"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let observer: Observer<T> = Rc::new(RefCell::new(observer));
        self.inner.observers.borrow_mut().push((id, Rc::clone(&observer)));

        let current = self.get();
        (&mut *observer.borrow_mut())(&current);

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.observers.borrow_mut().retain(|(oid, _)| *oid != id);
                }
            })),
        }
    }

    /// Stores `value` and notifies every observer.
    pub fn next(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    fn notify(&self) {
        let current = self.get();
        // Snapshot so observers can subscribe or unsubscribe while we iterate.
        let observers: Vec<Observer<T>> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            // An observer that publishes back into this subject is already
            // borrowed; skip it rather than panic.
            if let Ok(mut f) = observer.try_borrow_mut() {
                (&mut *f)(&current);
            }
        }
    }
}

impl<T: Clone + PartialEq + 'static> Subject<T> {
    /// Publishes `value` only if it differs from the current value.
    ///
    /// Returns `true` if observers were notified.
    pub fn next_if_changed(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.next(value);
        true
    }
}

/// Handle that keeps an observer registered.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Removes the observer. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
