//! Stripe table (C6)
//!
//! A fixed-size table of semaphores, sized to a prime via [`crate::prime`]
//! so that hash-to-index distributes keys evenly even when keys themselves
//! hash with low-bit patterns. No per-key allocation, no registry, no
//! pooling: a key always maps to the same slot for the table's lifetime.

use crate::prime::get_prime;
use crate::semaphore::CountingSemaphore;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub(crate) struct StripeTable {
    stripes: Vec<CountingSemaphore>,
}

impl StripeTable {
    /// Builds a table with `get_prime(number_of_stripes)` slots, each
    /// holding `max_count` permits. `number_of_stripes == 0` yields an
    /// empty (disabled) table: [`index`](Self::index) always returns
    /// `None` and every operation on it is a no-op.
    pub(crate) fn new(number_of_stripes: usize, max_count: usize) -> Self {
        if number_of_stripes == 0 {
            return Self { stripes: Vec::new() };
        }
        let len = get_prime(number_of_stripes as i64).max(1) as usize;
        let stripes = (0..len).map(|_| CountingSemaphore::new(max_count)).collect();
        Self { stripes }
    }

    pub(crate) fn len(&self) -> usize {
        self.stripes.len()
    }

    pub(crate) fn index<K: Hash>(&self, key: &K) -> Option<usize> {
        if self.stripes.is_empty() {
            return None;
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        Some((hasher.finish() % self.stripes.len() as u64) as usize)
    }

    pub(crate) fn get(&self, index: usize) -> &CountingSemaphore {
        &self.stripes[index]
    }
}
