//! Subscriber notification for stores.
//!
//! Every store is an explicit context object; views register a listener and
//! re-render when it fires. Listeners run after the state lock is released,
//! so they may read the store they were notified by.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Handle returned by `subscribe`, used to unsubscribe
pub type SubscriptionId = u64;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

pub struct Subscribers<E> {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the id was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Synchronous state wrapped with change notification.
///
/// Used for the pure filter and tab stores so a module can share one
/// instance between every view that shows it.
pub struct Observable<T> {
    state: RwLock<T>,
    subscribers: Subscribers<()>,
}

impl<T> Observable<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: RwLock::new(state),
            subscribers: Subscribers::new(),
        }
    }

    /// Read without notifying
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.read())
    }

    /// Mutate, then notify subscribers
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.state.write());
        self.subscribers.emit(&());
        result
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl<T: Clone> Observable<T> {
    pub fn snapshot(&self) -> T {
        self.state.read().clone()
    }
}
