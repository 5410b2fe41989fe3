//! Counted key registry (C5)
//!
//! Maps live keys to their [`Body`], handing out and reclaiming bodies via
//! the pool (C4). Backed by `dashmap::DashMap`, whose sharded, per-bucket
//! locking is what makes the rent/release path on the hot path cheap: two
//! unrelated keys almost never contend on the same shard lock.

use crate::body::Body;
use crate::pool::Pool;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) struct Registry<K: Eq + Hash + Clone> {
    map: DashMap<K, Arc<Body<K>>>,
    pool: Pool<K>,
    max_count: usize,
}

impl<K: Eq + Hash + Clone> Registry<K> {
    pub(crate) fn new(max_count: usize, pool_size: usize, pool_initial_fill: usize) -> Self {
        Self::with_shard_hint(max_count, pool_size, pool_initial_fill, 0, 0)
    }

    /// Like [`new`](Self::new), but forwards `concurrency_level`/`capacity`
    /// hints to the backing map's shard count, as spec'd for the counted
    /// registry's construction options. Purely a sizing hint: `0` lets
    /// `dashmap` pick its own defaults.
    pub(crate) fn with_shard_hint(
        max_count: usize,
        pool_size: usize,
        pool_initial_fill: usize,
        concurrency_level: usize,
        capacity: usize,
    ) -> Self {
        let map = if concurrency_level == 0 {
            DashMap::with_capacity(capacity)
        } else {
            DashMap::with_capacity_and_shard_amount(capacity, concurrency_level.next_power_of_two())
        };
        Self {
            map,
            pool: Pool::new(pool_size, pool_initial_fill, max_count),
            max_count,
        }
    }

    /// Finds or creates the body for `key`, incrementing its reference
    /// count. The whole find-or-insert happens under dashmap's per-shard
    /// write lock, so a concurrent `get_or_create`/`release` for the same
    /// key can never interleave inside it.
    pub(crate) fn get_or_create(&self, key: K) -> Arc<Body<K>> {
        match self.map.entry(key.clone()) {
            Entry::Occupied(e) => {
                e.get().refcount.fetch_add(1, Ordering::AcqRel);
                Arc::clone(e.get())
            }
            Entry::Vacant(v) => {
                let body = self.pool.rent(key);
                body.refcount.store(1, Ordering::Release);
                v.insert(Arc::clone(&body));
                body
            }
        }
    }

    /// Undoes a [`get_or_create`](Self::get_or_create) that never turned
    /// into a held permit (the wait failed with a timeout or cancellation).
    /// Does not touch the semaphore.
    pub(crate) fn unrent(&self, body: &Arc<Body<K>>) {
        self.decrement_and_maybe_reclaim(body);
    }

    /// Releases the permit `body` holds and, if this was the last holder,
    /// unregisters the key and returns the body to the pool.
    ///
    /// Order matters: the permit is released before the refcount is
    /// dropped, so a waiter already registered on this body's semaphore is
    /// woken before the key can possibly be evicted out from under it.
    pub(crate) fn release(&self, body: &Arc<Body<K>>) {
        body.sem.release_raw(1);
        self.decrement_and_maybe_reclaim(body);
    }

    fn decrement_and_maybe_reclaim(&self, body: &Arc<Body<K>>) {
        let Some(key) = body.bound_key() else {
            body.refcount.fetch_sub(1, Ordering::AcqRel);
            return;
        };
        match self.map.entry(key) {
            Entry::Occupied(e) if Arc::ptr_eq(e.get(), body) => {
                if e.get().refcount.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let (_, removed) = e.remove_entry();
                    self.pool.return_body(removed);
                }
            }
            // Body already detached from the map by a prior reclaim; our
            // holder is just one of its now-orphaned references.
            _ => {
                body.refcount.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }

    /// `true` iff the map has an entry for `key` whose bound key still
    /// equals `key` and whose refcount is positive. The bound-key
    /// revalidation defeats the race where a pool-recycled body has been
    /// rebound to a different key between the lookup and this check.
    pub(crate) fn is_in_use(&self, key: &K) -> bool {
        self.map.get(key).is_some_and(|b| {
            b.bound_key().as_ref() == Some(key) && b.refcount.load(Ordering::Acquire) > 0
        })
    }

    /// `M - sem.permits()` if the key has an entry, else `0`: the number of
    /// permits currently held against `key`.
    pub(crate) fn remaining_count(&self, key: &K) -> usize {
        self.map
            .get(key)
            .map(|b| self.max_count - b.sem.available_permits())
            .unwrap_or(0)
    }

    /// `sem.permits()` if the key has an entry, else `M`: the number of
    /// permits still free for `key`.
    pub(crate) fn current_count(&self, key: &K) -> usize {
        self.map
            .get(key)
            .map(|b| b.sem.available_permits())
            .unwrap_or(self.max_count)
    }

    /// Snapshot of currently-registered keys. No ordering guarantee; the
    /// map may gain or lose entries between this call returning and the
    /// caller observing the result.
    pub(crate) fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.map.iter().map(|e| e.key().clone()).collect()
    }

    #[cfg(test)]
    pub(crate) fn ref_count(&self, key: &K) -> usize {
        self.map
            .get(key)
            .map(|b| b.refcount.load(Ordering::Acquire))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_hint_is_honored_without_affecting_correctness() {
        let registry: Registry<&str> = Registry::with_shard_hint(1, 0, 0, 4, 16);
        let a = registry.get_or_create("k");
        let b = registry.get_or_create("k");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn get_or_create_shares_body_for_same_key() {
        let registry: Registry<&str> = Registry::new(1, 0, 0);
        let a = registry.get_or_create("k");
        let b = registry.get_or_create("k");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.ref_count(&"k"), 2);
    }

    #[test]
    fn release_to_zero_unregisters_and_recycles() {
        let registry: Registry<&str> = Registry::new(1, 1, 0);
        let body = registry.get_or_create("k");
        assert!(body.sem.try_acquire_raw());
        registry.release(&body);
        assert!(!registry.is_in_use(&"k"));
        // Key no longer registered: readings fall back to their defaults.
        assert_eq!(registry.current_count(&"k"), 1);
        assert_eq!(registry.remaining_count(&"k"), 0);
    }

    #[test]
    fn unrent_does_not_touch_semaphore() {
        let registry: Registry<&str> = Registry::new(1, 0, 0);
        let body = registry.get_or_create("k");
        let permits_before = body.sem.available_permits();
        registry.unrent(&body);
        assert_eq!(body.sem.available_permits(), permits_before);
        assert_eq!(registry.ref_count(&"k"), 0);
    }

    #[test]
    fn unknown_key_reports_defaults() {
        let registry: Registry<&str> = Registry::new(3, 0, 0);
        assert_eq!(registry.current_count(&"missing"), 3);
        assert_eq!(registry.remaining_count(&"missing"), 0);
    }

    #[test]
    fn second_holder_keeps_body_registered_after_first_release() {
        let registry: Registry<&str> = Registry::new(2, 0, 0);
        let a = registry.get_or_create("k");
        let _b = registry.get_or_create("k");
        registry.release(&a);
        assert_eq!(registry.ref_count(&"k"), 1);
        assert!(registry.is_in_use(&"k"));
        assert_eq!(registry.current_count(&"k"), 1);
        assert_eq!(registry.remaining_count(&"k"), 1);
    }
}
