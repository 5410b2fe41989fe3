//! Semaphore body: the record a key is bound to (§3 DATA MODEL)
//!
//! Used by both variants. The striped variant (C6) never inspects
//! `refcount` or `key`; they exist only so the counted registry (C5) and
//! the pool (C4) can share this one type.

use crate::semaphore::CountingSemaphore;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A semaphore plus the bookkeeping the counted registry needs to share it
/// safely across holders and across pool rent/return cycles.
pub(crate) struct Body<K> {
    pub(crate) sem: CountingSemaphore,
    pub(crate) refcount: AtomicUsize,
    /// Bound key, used only to disambiguate a pool-recycled body from a
    /// stale reader's point of view (see `registry::Registry::is_in_use`).
    key: Mutex<Option<K>>,
    /// Diagnostic-only latch: "has at least one holder ever entered". Never
    /// used to answer `is_in_use` (see DESIGN.md's note on this).
    in_use_flag: AtomicBool,
}

impl<K> Body<K> {
    pub(crate) fn new(max_count: usize) -> Self {
        Self {
            sem: CountingSemaphore::new(max_count),
            refcount: AtomicUsize::new(0),
            key: Mutex::new(None),
            in_use_flag: AtomicBool::new(false),
        }
    }

    pub(crate) fn bound_key(&self) -> Option<K>
    where
        K: Clone,
    {
        self.key.lock().unwrap().clone()
    }

    pub(crate) fn bind(&self, key: K) {
        *self.key.lock().unwrap() = Some(key);
    }

    pub(crate) fn unbind(&self) {
        *self.key.lock().unwrap() = None;
    }

    pub(crate) fn mark_entered(&self) {
        self.in_use_flag.store(true, Ordering::Relaxed);
    }
}
