/*
 * reactive.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Minimal observable single-value container.
//!
//! A [`Reactive`] holds one [`Value`] and a list of subscribers. It is a
//! shared handle (`Rc`), single-threaded, and notifies synchronously:
//!
//! 1. Subscribers are notified in registration order.
//! 2. Assigning a value loosely equal to the current one is a no-op.
//! 3. Subscribing delivers the current value right away unless it is
//!    `Null` or `Undefined`.
//! 4. Calling an [`Unsubscribe`] handle removes exactly that subscriber;
//!    further calls do nothing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::value::Value;

type Subscriber = Rc<dyn Fn(&Value)>;

/// An observable value with change-only notification.
#[derive(Clone)]
pub struct Reactive(Rc<ReactiveInner>);

struct ReactiveInner {
    id: String,
    value: RefCell<Value>,
    subscribers: RefCell<Vec<(u64, Subscriber)>>,
    next_subscriber: Cell<u64>,
    disposables: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Reactive {
    /// Create a reactive value with a generated id.
    pub fn new(value: Value) -> Self {
        Self::with_id(format!("reactive-{}", uuid::Uuid::new_v4().simple()), value)
    }

    /// Create a reactive value with an explicit id.
    pub fn with_id(id: impl Into<String>, value: Value) -> Self {
        Reactive(Rc::new(ReactiveInner {
            id: id.into(),
            value: RefCell::new(value),
            subscribers: RefCell::new(Vec::new()),
            next_subscriber: Cell::new(0),
            disposables: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Current value.
    pub fn get(&self) -> Value {
        self.0.value.borrow().clone()
    }

    /// Assign a new value and notify subscribers if it changed.
    ///
    /// Returns `true` if subscribers were notified.
    pub fn set(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if self.0.value.borrow().loosely_equals(&value) {
            return false;
        }
        *self.0.value.borrow_mut() = value.clone();

        // Snapshot so subscribers may (un)subscribe or set again while notified
        let subscribers: Vec<Subscriber> = self
            .0
            .subscribers
            .borrow()
            .iter()
            .map(|(_, s)| Rc::clone(s))
            .collect();
        tracing::trace!(id = %self.0.id, subscribers = subscribers.len(), "Notifying subscribers");
        for subscriber in subscribers {
            subscriber(&value);
        }
        true
    }

    /// Register a subscriber.
    ///
    /// The current value is delivered immediately unless it is nullish.
    pub fn subscribe(&self, subscriber: impl Fn(&Value) + 'static) -> Unsubscribe {
        let subscriber: Subscriber = Rc::new(subscriber);
        let current = self.get();
        if !current.is_nullish() {
            subscriber(&current);
        }

        let key = self.0.next_subscriber.get();
        self.0.next_subscriber.set(key + 1);
        self.0.subscribers.borrow_mut().push((key, subscriber));

        let weak: Weak<ReactiveInner> = Rc::downgrade(&self.0);
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|(k, _)| *k != key);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.borrow().len()
    }

    /// Keep a disposable to run when this value is disposed.
    pub fn collect(&self, disposable: impl FnOnce() + 'static) {
        self.0.disposables.borrow_mut().push(Box::new(disposable));
    }

    /// Drop all subscribers and run all collected disposables.
    pub fn dispose(&self) {
        self.0.subscribers.borrow_mut().clear();
        let disposables = std::mem::take(&mut *self.0.disposables.borrow_mut());
        for disposable in disposables {
            disposable();
        }
    }

    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("id", &self.0.id)
            .field("value", &*self.0.value.borrow())
            .finish()
    }
}

/// Handle removing one subscription.
///
/// Cloning shares the handle; the removal runs at most once.
#[derive(Clone)]
pub struct Unsubscribe(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Unsubscribe {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Unsubscribe(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Run the removal if it has not run yet.
    pub fn call(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f();
        }
    }

    /// `true` until the handle has been called.
    pub fn is_active(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<Value>>>, impl Fn(&Value) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v: &Value| sink.borrow_mut().push(v.clone()))
    }

    #[test]
    fn test_subscribe_delivers_current_value() {
        let r = Reactive::new(Value::Number(5.0));
        let (seen, sub) = recorder();
        let _unsub = r.subscribe(sub);
        assert_eq!(*seen.borrow(), vec![Value::Number(5.0)]);
    }

    #[test]
    fn test_subscribe_skips_null_current_value() {
        let r = Reactive::new(Value::Null);
        let (seen, sub) = recorder();
        let _unsub = r.subscribe(sub);
        assert!(seen.borrow().is_empty());

        r.set(1);
        assert_eq!(*seen.borrow(), vec![Value::Number(1.0)]);
    }

    #[test]
    fn test_setting_equal_value_does_not_notify() {
        let r = Reactive::new(Value::Number(5.0));
        let (seen, sub) = recorder();
        let _unsub = r.subscribe(sub);

        assert!(!r.set(5));
        assert!(!r.set("5"));
        assert_eq!(seen.borrow().len(), 1);

        assert!(r.set(6));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let r = Reactive::new(Value::Null);
        let (seen, sub) = recorder();
        let unsub = r.subscribe(sub);
        r.set("a");
        unsub.call();
        r.set("b");
        assert_eq!(*seen.borrow(), vec![Value::string("a")]);
        assert_eq!(r.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_removes_only_its_subscriber() {
        let r = Reactive::new(Value::Null);
        let (first, sub1) = recorder();
        let (second, sub2) = recorder();
        let unsub1 = r.subscribe(sub1);
        let _unsub2 = r.subscribe(sub2);

        unsub1.call();
        unsub1.call();
        r.set(true);

        assert!(first.borrow().is_empty());
        assert_eq!(*second.borrow(), vec![Value::Bool(true)]);
    }

    #[test]
    fn test_notification_order_is_registration_order() {
        let r = Reactive::new(Value::Null);
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..3 {
            let order = Rc::clone(&order);
            handles.push(r.subscribe(move |_| order.borrow_mut().push(i)));
        }
        r.set(1);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dispose_clears_subscribers_and_runs_disposables() {
        let r = Reactive::new(Value::Null);
        let (seen, sub) = recorder();
        let _unsub = r.subscribe(sub);
        let disposed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&disposed);
        r.collect(move || counter.set(counter.get() + 1));

        r.dispose();
        r.dispose();
        r.set(1);

        assert!(seen.borrow().is_empty());
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    fn test_reentrant_set_from_subscriber() {
        let r = Reactive::new(Value::Null);
        let inner = r.clone();
        let _unsub = r.subscribe(move |v| {
            if let Value::Number(n) = v {
                if *n < 3.0 {
                    inner.set(n + 1.0);
                }
            }
        });
        r.set(0);
        assert_eq!(r.get(), Value::Number(3.0));
    }
}
