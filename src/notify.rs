//! Observer registry for newly accepted entries
//!
//! Dispatch is synchronous and happens after the store lock is released.
//! Each observer is isolated: an `Err` or a panic from one observer is
//! reported through `tracing` and delivery continues with the next one.
//! Observers must rely on the entry's own id and timestamp for ordering,
//! since two producers may notify in a different order than their ids.

use std::any::Any;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub type ObserverError = Box<dyn Error + Send + Sync + 'static>;
pub type ObserverResult = Result<(), ObserverError>;

/// Receives each entry accepted by a store
pub trait Observer<T>: Send + Sync {
    fn on_entry(&self, entry: &T) -> ObserverResult;
}

impl<T, F> Observer<T> for F
where
    F: Fn(&T) -> ObserverResult + Send + Sync,
{
    fn on_entry(&self, entry: &T) -> ObserverResult {
        self(entry)
    }
}

/// Handle returned by [`Notifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Registry of observers for one stream
pub struct Notifier<T> {
    name: &'static str,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn Observer<T>>)>>,
    next_id: AtomicU64,
}

impl<T> Notifier<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        debug!(stream = self.name, subscription = id.0, "Observer subscribed");
        id
    }

    /// Returns false if the id was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        let removed = observers.len() != before;
        if removed {
            debug!(stream = self.name, subscription = id.0, "Observer unsubscribed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    pub fn clear(&self) {
        self.observers.write().clear();
    }

    /// Deliver `entry` to every observer in registration order
    ///
    /// Returns the number of observers that failed.
    pub fn notify(&self, entry: &T) -> usize {
        // Snapshot so observers may (un)subscribe from inside a callback.
        let observers: Vec<_> = self.observers.read().clone();
        let mut failures = 0;

        for (id, observer) in observers {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.on_entry(entry))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    warn!(stream = self.name, subscription = id.0, error = %err, "Observer failed");
                }
                Err(payload) => {
                    failures += 1;
                    warn!(
                        stream = self.name,
                        subscription = id.0,
                        panic = panic_message(payload.as_ref()),
                        "Observer panicked"
                    );
                }
            }
        }

        failures
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Observer that republishes entries on a broadcast channel
///
/// A receiver that falls behind loses the oldest entries
/// (`RecvError::Lagged`) instead of slowing producers down.
pub struct LiveFeed<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> LiveFeed<T> {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<T>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn receiver(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for LiveFeed<T> {
    fn on_entry(&self, entry: &T) -> ObserverResult {
        // No live receivers is not a failure; the viewer simply went away.
        let _ = self.tx.send(entry.clone());
        Ok(())
    }
}

/// A live subscription created by [`Logger::watch`](crate::Logger::watch)
pub struct Watch<T> {
    pub id: SubscriptionId,
    pub receiver: broadcast::Receiver<T>,
}
