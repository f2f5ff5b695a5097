//! Bounded compute-once cache.
//!
//! [`ComputeCache`] maps a [`CacheKey`] to a lazily computed value. Concurrent callers
//! asking for the same key share one computation: the first caller runs the compute
//! future, the rest wait on the same cell and observe its result.
//!
//! # Eviction
//!
//! Capacity is enforced on insertion only, oldest key first (FIFO). Reads never
//! refresh an entry, so this is deliberately *not* an LRU: within one pipeline run a
//! key is not looked up again after its first use often enough for recency to matter,
//! and tests depend on insertion-order eviction.
//!
//! An entry whose computation is still running is never evicted; the cache may hold
//! more than `capacity` keys until those computations settle.
//!
//! A failed computation is shared with every caller that waited on it, then its slot
//! is dropped, so the next caller retries instead of observing a cached error.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::constants::DEFAULT_CACHE_CAPACITY;
use crate::hashing::CacheKey;

type Cell<V, E> = Arc<OnceCell<Result<V, E>>>;

struct Slots<V, E> {
    cells: HashMap<CacheKey, Cell<V, E>>,
    order: VecDeque<CacheKey>,
}

pub struct ComputeCache<V, E> {
    slots: Mutex<Slots<V, E>>,
    capacity: usize,
}

impl<V: Clone + Send + Sync, E: Clone + Send + Sync> ComputeCache<V, E> {
    /// Creates a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` settled keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                cells: HashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
                order: VecDeque::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
            }),
            capacity,
        }
    }

    /// Returns the cached value for `key`, running `compute` at most once per key.
    ///
    /// Callers that arrive while a computation is in flight wait for it and get its
    /// outcome, error included.
    pub async fn get_or_try_compute<F, Fut>(&self, key: CacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.slot(key);
        let result = cell.get_or_init(compute).await.clone();
        if result.is_err() {
            self.discard(&key, &cell);
        }
        result
    }

    /// Returns a completed value without computing.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let slots = self.slots.lock();
        slots
            .cells
            .get(key)
            .and_then(|cell| cell.get())
            .and_then(|result| result.as_ref().ok().cloned())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of tracked keys (including computations still in flight).
    pub fn len(&self) -> usize {
        self.slots.lock().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        slots.cells.clear();
        slots.order.clear();
    }

    fn slot(&self, key: CacheKey) -> Cell<V, E> {
        let mut guard = self.slots.lock();
        if let Some(cell) = guard.cells.get(&key) {
            return Arc::clone(cell);
        }

        let Slots { cells, order } = &mut *guard;
        let cell = Arc::new(OnceCell::new());
        cells.insert(key, Arc::clone(&cell));
        order.push_back(key);

        while order.len() > self.capacity {
            let settled = order
                .iter()
                .position(|k| cells.get(k).is_none_or(|c| c.initialized()));
            let Some(index) = settled else { break };
            if let Some(oldest) = order.remove(index) {
                cells.remove(&oldest);
            }
        }

        cell
    }

    /// Drops a failed slot, unless a later caller already replaced it.
    fn discard(&self, key: &CacheKey, failed: &Cell<V, E>) {
        let mut guard = self.slots.lock();
        let is_current = guard
            .cells
            .get(key)
            .is_some_and(|cell| Arc::ptr_eq(cell, failed));
        if is_current {
            guard.cells.remove(key);
            guard.order.retain(|k| k != key);
        }
    }
}

impl<V: Clone + Send + Sync, E: Clone + Send + Sync> Default for ComputeCache<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> std::fmt::Debug for ComputeCache<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeCache")
            .field("entries", &self.slots.lock().cells.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
