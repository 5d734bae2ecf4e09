use std::{
    collections::HashMap,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::CancellationToken;

struct Entry {
    generation: u64,
    token: CancellationToken,
}

struct SupersedeInner<K> {
    next_generation: AtomicU64,
    entries: Mutex<HashMap<K, Entry>>,
}

/// Tracks the single live query per key (typically a document).
///
/// Starting a new query for a key cancels whatever query was running for it before. Keys are
/// independent, so queries in different documents never cancel each other.
pub struct Supersede<K> {
    inner: Arc<SupersedeInner<K>>,
}

impl<K> Clone for Supersede<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for Supersede<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Supersede<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SupersedeInner {
                next_generation: AtomicU64::new(1),
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a new query for `key`, cancelling the previous one.
    pub fn begin(&self, key: K) -> Lease<K> {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.inner.entries.lock().insert(
            key.clone(),
            Entry {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            tracing::trace!(
                target: "kopi.scheduler",
                superseded = previous.generation,
                by = generation,
                "cancelling superseded query"
            );
            previous.token.cancel();
        }

        Lease {
            key: Some(key),
            generation,
            token,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Cancel the live query for `key`, if any. Returns whether one existed.
    pub fn cancel(&self, key: &K) -> bool {
        let Some(entry) = self.inner.entries.lock().remove(key) else {
            return false;
        };
        entry.token.cancel();
        true
    }

    pub fn cancel_all(&self) {
        let drained: Vec<Entry> = self.inner.entries.lock().drain().map(|(_, e)| e).collect();
        for entry in drained {
            entry.token.cancel();
        }
    }

    pub fn is_current(&self, key: &K, generation: u64) -> bool {
        self.inner
            .entries
            .lock()
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
    }

    pub fn live_count(&self) -> usize {
        self.inner.entries.lock().len()
    }
}

/// The right to run one query for a key until a newer one begins.
///
/// Dropping the lease forgets the entry if it is still current, without cancelling its token.
pub struct Lease<K>
where
    K: Eq + Hash,
{
    key: Option<K>,
    generation: u64,
    token: CancellationToken,
    inner: Arc<SupersedeInner<K>>,
}

impl<K> Lease<K>
where
    K: Eq + Hash,
{
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Still the newest query for its key, and not cancelled.
    pub fn is_current(&self) -> bool {
        let Some(key) = self.key.as_ref() else {
            return false;
        };
        !self.token.is_cancelled()
            && self
                .inner
                .entries
                .lock()
                .get(key)
                .is_some_and(|entry| entry.generation == self.generation)
    }

    /// Release the lease; equivalent to dropping it.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let mut entries = self.inner.entries.lock();
        if entries
            .get(&key)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            entries.remove(&key);
        }
    }
}

impl<K> Drop for Lease<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.release();
    }
}
