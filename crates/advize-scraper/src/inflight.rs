//! Single-flight coalescing of identical concurrent scrapes.
//!
//! While a scrape for a key is running, later callers with the same key wait
//! for that run instead of starting another actor run. Entries are dropped
//! as soon as the value is produced; nothing is cached afterwards.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

type Calls<K, V> = Mutex<HashMap<K, Arc<OnceCell<V>>>>;

pub struct InFlight<K, V> {
    calls: Calls<K, V>,
}

impl<K, V> Default for InFlight<K, V> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> InFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` for `key`, or joins the run already in progress for it.
    ///
    /// If the caller driving the shared run is cancelled, one of the waiting
    /// callers starts `work` again.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(calls.entry(key.clone()).or_default())
        };
        let _release = Release {
            calls: &self.calls,
            key: &key,
            cell: &cell,
        };

        cell.get_or_init(work).await.clone()
    }

    /// Number of keys with a run in progress.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes a finished (or abandoned) entry when its last waiter leaves,
/// including when the waiting future is dropped mid-flight.
struct Release<'a, K: Eq + Hash, V> {
    calls: &'a Calls<K, V>,
    key: &'a K,
    cell: &'a Arc<OnceCell<V>>,
}

impl<K: Eq + Hash, V> Drop for Release<'_, K, V> {
    fn drop(&mut self) {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = calls.get(self.key) else {
            return;
        };
        if !Arc::ptr_eq(current, self.cell) {
            return;
        }
        // One reference is held by the map and one by this waiter.
        if self.cell.initialized() || Arc::strong_count(self.cell) <= 2 {
            calls.remove(self.key);
        }
    }
}
