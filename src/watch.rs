//! Single-threaded observables.
//!
//! [`Watch`] holds a value and notifies subscribers only when a newly set
//! value differs from the current one. [`Bus`] broadcasts every message it
//! is given. Both hand out [`Subscription`] guards; dropping a guard stops
//! delivery to that callback, including during an in-flight notification.
//!
//! Publishing from inside a callback is allowed. The nested publish is
//! delivered to everyone once the current round of callbacks finishes.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

type Callback<T> = Box<dyn FnMut(&T)>;

struct Subscriber<T> {
    alive: Rc<Cell<bool>>,
    callback: Callback<T>,
}

/// Subscriber list shared by [`Watch`] and [`Bus`].
struct Subscribers<T> {
    list: RefCell<Vec<Subscriber<T>>>,
}

impl<T> Subscribers<T> {
    fn new() -> Self {
        Self {
            list: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, callback: Callback<T>) -> Subscription {
        let alive = Rc::new(Cell::new(true));
        let mut list = self.list.borrow_mut();
        list.retain(|s| s.alive.get());
        list.push(Subscriber {
            alive: Rc::clone(&alive),
            callback,
        });
        Subscription { alive }
    }

    /// Deliver `value` to every live subscriber.
    ///
    /// The list is taken out while callbacks run, so a callback may
    /// subscribe, unsubscribe, or publish again without a borrow conflict.
    fn notify(&self, value: &T) {
        let mut current = std::mem::take(&mut *self.list.borrow_mut());
        for sub in &mut current {
            if sub.alive.get() {
                (sub.callback)(value);
            }
        }
        let mut list = self.list.borrow_mut();
        let added = std::mem::take(&mut *list);
        current.extend(added);
        current.retain(|s| s.alive.get());
        *list = current;
    }

    fn len(&self) -> usize {
        self.list.borrow().iter().filter(|s| s.alive.get()).count()
    }
}

/// Guard for a live subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    alive: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.alive.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}

struct WatchInner<T> {
    value: RefCell<T>,
    subscribers: Subscribers<T>,
    notifying: Cell<bool>,
    dirty: Cell<bool>,
}

/// An equality-gated observable value.
///
/// Cloning a `Watch` yields another handle to the same value.
pub struct Watch<T> {
    inner: Rc<WatchInner<T>>,
}

impl<T> Clone for Watch<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Watch<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(WatchInner {
                value: RefCell::new(value),
                subscribers: Subscribers::new(),
                notifying: Cell::new(false),
                dirty: Cell::new(false),
            }),
        }
    }

    /// A copy of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify subscribers if it changed.
    ///
    /// Returns whether a notification went out.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        if self.inner.notifying.get() {
            self.inner.dirty.set(true);
            return true;
        }
        self.inner.notifying.set(true);
        loop {
            let snapshot = self.get();
            self.inner.subscribers.notify(&snapshot);
            if !self.inner.dirty.replace(false) {
                break;
            }
        }
        self.inner.notifying.set(false);
        true
    }

    /// Subscribe to future changes. The current value is not replayed.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        self.inner.subscribers.add(Box::new(callback))
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

struct BusInner<M> {
    subscribers: Subscribers<M>,
    queue: RefCell<VecDeque<M>>,
    delivering: Cell<bool>,
}

/// A broadcast channel of typed messages. Every publish is delivered, in
/// publish order.
pub struct Bus<M> {
    inner: Rc<BusInner<M>>,
}

impl<M> Clone for Bus<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<M: 'static> Default for Bus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: 'static> Bus<M> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BusInner {
                subscribers: Subscribers::new(),
                queue: RefCell::new(VecDeque::new()),
                delivering: Cell::new(false),
            }),
        }
    }

    pub fn publish(&self, message: M) {
        self.inner.queue.borrow_mut().push_back(message);
        if self.inner.delivering.replace(true) {
            return;
        }
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(message) = next else { break };
            self.inner.subscribers.notify(&message);
        }
        self.inner.delivering.set(false);
    }

    pub fn subscribe(&self, callback: impl FnMut(&M) + 'static) -> Subscription {
        self.inner.subscribers.add(Box::new(callback))
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}
