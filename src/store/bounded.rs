use std::collections::VecDeque;

use parking_lot::RwLock;
use tracing::trace;

/// Checkpoint value meaning "nothing seen yet"
pub const NO_CHECKPOINT: i64 = -1;

struct Inner<T> {
    entries: VecDeque<T>,
    next_id: i64,
}

/// Fixed-capacity FIFO store keyed by a monotonic id
///
/// Ids start at 0 and are assigned under the write lock, so concurrent
/// appends never share or skip an id. Once `capacity` entries are held, each
/// append evicts the oldest one. Retained ids are therefore always the range
/// `next_id - len .. next_id`.
pub struct BoundedStore<T> {
    capacity: usize,
    inner: RwLock<Inner<T>>,
}

impl<T: Clone> BoundedStore<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: RwLock::new(Inner {
                entries: VecDeque::with_capacity(capacity.min(4096)),
                next_id: 0,
            }),
        }
    }

    /// Insert the entry built for the next id and return a copy of it
    ///
    /// The copy is taken before the lock is released so callers can notify
    /// observers without holding the store.
    pub fn append_with<F>(&self, build: F) -> T
    where
        F: FnOnce(i64) -> T,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;

        if inner.entries.len() >= self.capacity {
            inner.entries.pop_front();
            trace!(evicted = id - self.capacity as i64, "Evicted oldest entry");
        }

        let entry = build(id);
        inner.entries.push_back(entry.clone());
        inner.next_id = id + 1;

        entry
    }

    /// Entries newer than `checkpoint`, oldest first
    ///
    /// `NO_CHECKPOINT` returns everything retained. A checkpoint whose entry
    /// was already evicted (or any value below the retained window) also
    /// returns everything retained; a checkpoint at or past the newest id
    /// returns nothing.
    pub fn query(&self, checkpoint: i64) -> Vec<T> {
        self.query_where(checkpoint, |_| true)
    }

    /// Like [`query`](Self::query), keeping only entries matching `keep`
    pub fn query_where<P>(&self, checkpoint: i64, mut keep: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        let inner = self.inner.read();
        let size = inner.entries.len();

        let skip = if checkpoint == NO_CHECKPOINT {
            0
        } else {
            let diff = inner.next_id.saturating_sub(checkpoint).saturating_sub(1);
            if diff >= size as i64 {
                0
            } else if diff <= 0 {
                return Vec::new();
            } else {
                size - diff as usize
            }
        };

        inner
            .entries
            .iter()
            .skip(skip)
            .filter(|entry| keep(entry))
            .cloned()
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Id the next append will receive
    pub fn next_id(&self) -> i64 {
        self.inner.read().next_id
    }

    pub fn oldest_id(&self) -> Option<i64> {
        let inner = self.inner.read();
        (!inner.entries.is_empty()).then(|| inner.next_id - inner.entries.len() as i64)
    }

    pub fn newest_id(&self) -> Option<i64> {
        let inner = self.inner.read();
        (!inner.entries.is_empty()).then(|| inner.next_id - 1)
    }

    /// Drop every retained entry; the id counter keeps its value
    pub fn release(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.entries.shrink_to_fit();
    }
}
