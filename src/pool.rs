//! Semaphore-object pool (C4)
//!
//! A bounded reservoir of detached [`Body`] instances, reused across key
//! lifetimes to amortise allocation for workloads that churn through many
//! short-lived keys. Backed by `crossbeam_queue::SegQueue`, a lock-free
//! MPMC queue — the same hybrid "lock-free queue + atomic counter" shape
//! used for object pools elsewhere in the retrieval corpus.

use crate::body::Body;
use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// `pool_initial_fill`'s `-1` convention: "prefill to the pool's capacity".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolInitialFill {
    /// Prefill with exactly this many bodies (must be `<= pool_size`).
    Exact(usize),
    /// Prefill to the pool's full capacity (`F = P`).
    All,
}

pub(crate) struct Pool<K> {
    queue: SegQueue<Arc<Body<K>>>,
    len: AtomicUsize,
    capacity: usize,
    max_count: usize,
}

impl<K> Pool<K> {
    pub(crate) fn new(capacity: usize, initial_fill: usize, max_count: usize) -> Self {
        let pool = Self {
            queue: SegQueue::new(),
            len: AtomicUsize::new(0),
            capacity,
            max_count,
        };
        for _ in 0..initial_fill.min(capacity) {
            pool.queue.push(Arc::new(Body::new(max_count)));
            pool.len.fetch_add(1, Ordering::Relaxed);
        }
        pool
    }

    pub(crate) fn is_disabled(&self) -> bool {
        self.capacity == 0
    }

    /// Rents a body for `key`: reuses a pooled body if one is available
    /// (its semaphore is guaranteed full, per the pool's return invariant),
    /// otherwise allocates a fresh one.
    pub(crate) fn rent(&self, key: K) -> Arc<Body<K>> {
        if let Some(body) = self.queue.pop() {
            self.len.fetch_sub(1, Ordering::AcqRel);
            body.bind(key);
            tracing::trace!("rented body from pool");
            return body;
        }
        let body = Arc::new(Body::new(self.max_count));
        body.bind(key);
        tracing::trace!("allocated fresh body (pool empty)");
        body
    }

    /// Returns a detached body to the pool if there is room, resetting its
    /// key. Drops it (best-effort; there is no recycling to undo) if the
    /// pool is already at capacity.
    pub(crate) fn return_body(&self, body: Arc<Body<K>>) {
        if self.capacity == 0 {
            return;
        }
        body.unbind();
        loop {
            let current = self.len.load(Ordering::Acquire);
            if current >= self.capacity {
                tracing::trace!("pool at capacity, dropping returned body");
                return;
            }
            if self
                .len
                .compare_exchange_weak(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.queue.push(body);
                tracing::trace!("returned body to pool");
                return;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }
}
