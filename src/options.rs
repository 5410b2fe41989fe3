//! Construction options (§6 EXTERNAL INTERFACES)
//!
//! Plain builder structs, validated synchronously in `build()`/`new()` so a
//! misconfigured crate never allocates a single body.

use crate::error::Error;
use crate::pool::PoolInitialFill;

/// Options for [`crate::keyed::KeyedSemaphore`].
#[derive(Debug, Clone)]
pub struct KeyedSemaphoreOptions {
    max_count: usize,
    pool_size: usize,
    pool_initial_fill: PoolInitialFill,
    concurrency_level: usize,
    capacity: usize,
}

/// spec.md §6: default `pool_size`, "~20".
const DEFAULT_POOL_SIZE: usize = 20;

impl Default for KeyedSemaphoreOptions {
    fn default() -> Self {
        Self {
            max_count: 1,
            pool_size: DEFAULT_POOL_SIZE,
            pool_initial_fill: PoolInitialFill::All,
            concurrency_level: num_cpus::get(),
            capacity: 31,
        }
    }
}

impl KeyedSemaphoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permits per key (bounded concurrency per key; `1` is mutual
    /// exclusion). Must be `>= 1`.
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    /// Detached-body pool capacity. `0` disables pooling.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// How many bodies to prefill the pool with at construction.
    /// [`PoolInitialFill::All`] prefills to `pool_size`.
    pub fn with_pool_initial_fill(mut self, fill: PoolInitialFill) -> Self {
        self.pool_initial_fill = fill;
        self
    }

    /// Estimated concurrent-key count, forwarded to the backing map's shard
    /// count. Purely a hint: never affects correctness.
    pub fn with_concurrency_level(mut self, concurrency_level: usize) -> Self {
        self.concurrency_level = concurrency_level;
        self
    }

    /// Initial capacity hint for the backing map. Purely a sizing hint:
    /// never affects correctness.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub(crate) fn max_count(&self) -> usize {
        self.max_count
    }

    pub(crate) fn concurrency_level(&self) -> usize {
        self.concurrency_level
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn resolved_pool_initial_fill(&self) -> usize {
        match self.pool_initial_fill {
            PoolInitialFill::Exact(n) => n,
            PoolInitialFill::All => self.pool_size,
        }
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.max_count == 0 {
            return Err(Error::InvalidArgument(
                "max_count must be at least 1".to_string(),
            ));
        }
        if let PoolInitialFill::Exact(fill) = self.pool_initial_fill {
            if fill > self.pool_size {
                return Err(Error::InvalidArgument(format!(
                    "pool_initial_fill ({fill}) must not exceed pool_size ({})",
                    self.pool_size
                )));
            }
        }
        Ok(())
    }
}

/// Options for [`crate::keyed::StripedKeyedSemaphore`].
#[derive(Debug, Clone)]
pub struct StripedKeyedSemaphoreOptions {
    max_count: usize,
    number_of_stripes: usize,
}

impl Default for StripedKeyedSemaphoreOptions {
    fn default() -> Self {
        Self {
            max_count: 1,
            // spec.md §6: default `number_of_stripes` is the logical CPU
            // count, no multiplier.
            number_of_stripes: num_cpus::get(),
        }
    }
}

impl StripedKeyedSemaphoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    /// Fixed stripe-table size. The table is actually sized to the next
    /// prime `>= number_of_stripes` (see [`crate::prime::get_prime`]); `0`
    /// is permitted and yields a disabled (no-op) table.
    pub fn with_number_of_stripes(mut self, number_of_stripes: usize) -> Self {
        self.number_of_stripes = number_of_stripes;
        self
    }

    pub(crate) fn max_count(&self) -> usize {
        self.max_count
    }

    pub(crate) fn number_of_stripes(&self) -> usize {
        self.number_of_stripes
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.max_count == 0 {
            return Err(Error::InvalidArgument(
                "max_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
