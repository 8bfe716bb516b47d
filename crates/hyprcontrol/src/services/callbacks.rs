//! Snapshot callback registry shared by the panel services.
//!
//! Every service keeps a `Callbacks<Snapshot>` and invokes `notify` after
//! mutating its snapshot; panels register a closure at build time and stay
//! registered for the lifetime of the window.

use std::cell::RefCell;
use std::rc::Rc;

/// A list of callbacks that receive snapshot updates.
///
/// Callbacks are stored as `Rc<dyn Fn(&T)>` and cloned out of the registry
/// before invocation, so a callback may re-enter the owning service without
/// hitting a double borrow.
pub struct Callbacks<T> {
    inner: RefCell<Vec<Rc<dyn Fn(&T)>>>,
}

impl<T> Callbacks<T> {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Vec::new()),
        }
    }

    /// Register a callback to be invoked on snapshot updates.
    pub fn register<F>(&self, callback: F)
    where
        F: Fn(&T) + 'static,
    {
        self.inner.borrow_mut().push(Rc::new(callback));
    }

    /// Invoke all registered callbacks with the given snapshot.
    pub fn notify(&self, snapshot: &T) {
        let callbacks: Vec<_> = self.inner.borrow().iter().cloned().collect();
        for cb in callbacks {
            cb(snapshot);
        }
    }
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_register_and_notify() {
        let callbacks: Callbacks<i32> = Callbacks::new();
        let sum = Rc::new(Cell::new(0));

        let sum_clone = sum.clone();
        callbacks.register(move |value| {
            sum_clone.set(sum_clone.get() + *value);
        });

        callbacks.notify(&5);
        callbacks.notify(&3);
        assert_eq!(sum.get(), 8);
    }

    #[test]
    fn test_multiple_listeners_fire_in_order() {
        let callbacks: Callbacks<&str> = Callbacks::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_clone = log.clone();
        callbacks.register(move |s| log_clone.borrow_mut().push(format!("a:{s}")));
        let log_clone = log.clone();
        callbacks.register(move |s| log_clone.borrow_mut().push(format!("b:{s}")));

        callbacks.notify(&"x");
        assert_eq!(*log.borrow(), vec!["a:x", "b:x"]);
    }

    #[test]
    fn test_reentrant_notify_does_not_panic() {
        let callbacks: Rc<Callbacks<i32>> = Rc::new(Callbacks::new());
        let hits = Rc::new(Cell::new(0));

        let hits_clone = hits.clone();
        let callbacks_clone = callbacks.clone();
        callbacks.register(move |value| {
            hits_clone.set(hits_clone.get() + 1);
            // Re-entering from inside a callback must not double-borrow.
            if *value == 0 {
                callbacks_clone.notify(&1);
            }
        });

        callbacks.notify(&0);
        assert_eq!(hits.get(), 2);
    }
}
