//! Acquire orchestrator (C7)
//!
//! The public surface of this crate. [`KeyedSemaphore`] wraps the counted
//! registry (C5); [`StripedKeyedSemaphore`] wraps the stripe table (C6).
//! Both drive the same underlying [`CountingSemaphore`] wait/timeout/cancel
//! machinery (C2) — they differ only in how a key resolves to a body.

use crate::error::Error;
use crate::options::{KeyedSemaphoreOptions, StripedKeyedSemaphoreOptions};
use crate::registry::Registry;
use crate::releaser::{Releaser, StripedReleaser};
use crate::semaphore::AcquireOutcome;
use crate::stripe::StripeTable;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Mirrors the source ecosystem's configurable-await concept. Both variants
/// behave identically under compio's single-queue executor today; this
/// exists purely so callers migrating from a runtime that distinguishes the
/// two aren't left without the knob (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AwaitOptions {
    #[default]
    ContinueOnCapturedContext,
    ForceYielding,
}

fn apply_await_options(_options: AwaitOptions) {
    // No-op under compio's current executor; see AwaitOptions's doc comment.
}

/// Reference-counted keyed locker: allocates and reclaims a body per live
/// key, recycling detached bodies through a pool.
pub struct KeyedSemaphore<K: Eq + Hash + Clone + Send + Sync + 'static> {
    registry: std::sync::Arc<Registry<K>>,
}

impl<K: Eq + Hash + Clone + Send + Sync + 'static> KeyedSemaphore<K> {
    pub fn new(options: KeyedSemaphoreOptions) -> Result<Self, Error> {
        options.validate()?;
        Ok(Self {
            registry: std::sync::Arc::new(Registry::with_shard_hint(
                options.max_count(),
                options.pool_size(),
                options.resolved_pool_initial_fill(),
                options.concurrency_level(),
                options.capacity(),
            )),
        })
    }

    /// Waits indefinitely for `key`'s permit.
    pub async fn lock(&self, key: K) -> Releaser<K> {
        let body = self.registry.get_or_create(key);
        body.sem.acquire_raw().await;
        Releaser::holding(self.registry.clone(), body)
    }

    /// Like [`lock`](Self::lock) but honoring `await_options` for fidelity
    /// with the source ecosystem's configurable-await overloads.
    pub async fn lock_with_options(&self, key: K, await_options: AwaitOptions) -> Releaser<K> {
        apply_await_options(await_options);
        self.lock(key).await
    }

    /// Waits for `key`'s permit or until `cancel` fires.
    pub async fn lock_cancellable(
        &self,
        key: K,
        cancel: &CancellationToken,
    ) -> Result<Releaser<K>, Error> {
        let body = self.registry.get_or_create(key);
        match body.sem.acquire_cancellable_raw(cancel).await {
            AcquireOutcome::Acquired => Ok(Releaser::holding(self.registry.clone(), body)),
            AcquireOutcome::Cancelled => {
                self.registry.unrent(&body);
                Err(Error::Cancelled)
            }
            AcquireOutcome::TimedOut => unreachable!("unbounded wait never times out"),
        }
    }

    /// Waits up to `timeout` for `key`'s permit. On timeout, returns
    /// `Ok(Releaser)` with [`Releaser::entered`] `false` rather than an
    /// error — only cancellation is an `Err`.
    pub async fn lock_timeout(
        &self,
        key: K,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Releaser<K>, Error> {
        let body = self.registry.get_or_create(key);
        match body.sem.try_acquire_timeout(Some(timeout), cancel).await {
            AcquireOutcome::Acquired => Ok(Releaser::holding(self.registry.clone(), body)),
            AcquireOutcome::TimedOut => {
                self.registry.unrent(&body);
                Ok(Releaser::inert())
            }
            AcquireOutcome::Cancelled => {
                self.registry.unrent(&body);
                Err(Error::Cancelled)
            }
        }
    }

    /// Waits up to `timeout` for `key`'s permit, collapsing the timeout
    /// case to `None` instead of a non-entered [`Releaser`].
    pub async fn lock_or_none(
        &self,
        key: K,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<Releaser<K>>, Error> {
        match self.lock_timeout(key, timeout, cancel).await {
            Ok(releaser) if releaser.entered() => Ok(Some(releaser)),
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Acquires `key`'s permit for the duration of `f`, returning `None` if
    /// the wait times out. The lock is held exactly for `f`'s execution and
    /// released (via the releaser's `Drop`) as soon as `f` resolves, even
    /// if `f` panics (unwind safety of the `Drop` path).
    pub async fn try_lock_with<F, Fut, T>(
        &self,
        key: K,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
        f: F,
    ) -> Result<Option<T>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.lock_or_none(key, timeout, cancel).await? {
            Some(releaser) => {
                let result = f().await;
                drop(releaser);
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Acquires `key`'s permit only if `condition` is true; otherwise
    /// returns an inert [`Releaser`] immediately without registering or
    /// waiting. The caller's own `condition` is what makes double-locking
    /// (reentrancy) by the same logical caller expressible and safe.
    pub async fn conditional_lock(&self, key: K, condition: bool) -> Releaser<K> {
        if !condition {
            return Releaser::inert();
        }
        self.lock(key).await
    }

    pub fn is_in_use(&self, key: &K) -> bool {
        self.registry.is_in_use(key)
    }

    pub fn remaining_count(&self, key: &K) -> usize {
        self.registry.remaining_count(key)
    }

    pub fn current_count(&self, key: &K) -> usize {
        self.registry.current_count(key)
    }

    /// Snapshot of currently-live keys.
    pub fn index(&self) -> Vec<K> {
        self.registry.keys()
    }
}

/// Fixed-size striped keyed locker: keys hash into one of a small, constant
/// number of permanent semaphores. No per-key allocation or reclamation, at
/// the cost of unrelated keys occasionally sharing a stripe.
pub struct StripedKeyedSemaphore<K: Hash> {
    table: StripeTable,
    max_count: usize,
    _key: std::marker::PhantomData<K>,
}

impl<K: Hash> StripedKeyedSemaphore<K> {
    pub fn new(options: StripedKeyedSemaphoreOptions) -> Result<Self, Error> {
        options.validate()?;
        Ok(Self {
            table: StripeTable::new(options.number_of_stripes(), options.max_count()),
            max_count: options.max_count(),
            _key: std::marker::PhantomData,
        })
    }

    /// `None` iff `number_of_stripes == 0`, i.e. the table is empty and
    /// every operation on this locker must behave as a no-op (spec.md
    /// §4.6) rather than panic.
    fn stripe(&self, key: &K) -> Option<&crate::semaphore::CountingSemaphore> {
        self.table.index(key).map(|i| self.table.get(i))
    }

    pub async fn lock<'a>(&'a self, key: &K) -> StripedReleaser<'a> {
        let Some(sem) = self.stripe(key) else {
            return StripedReleaser::inert();
        };
        sem.acquire_raw().await;
        StripedReleaser::holding(sem)
    }

    pub async fn lock_with_options<'a>(
        &'a self,
        key: &K,
        await_options: AwaitOptions,
    ) -> StripedReleaser<'a> {
        apply_await_options(await_options);
        self.lock(key).await
    }

    pub async fn lock_cancellable<'a>(
        &'a self,
        key: &K,
        cancel: &CancellationToken,
    ) -> Result<StripedReleaser<'a>, Error> {
        let Some(sem) = self.stripe(key) else {
            return Ok(StripedReleaser::inert());
        };
        match sem.acquire_cancellable_raw(cancel).await {
            AcquireOutcome::Acquired => Ok(StripedReleaser::holding(sem)),
            AcquireOutcome::Cancelled => Err(Error::Cancelled),
            AcquireOutcome::TimedOut => unreachable!("unbounded wait never times out"),
        }
    }

    pub async fn lock_timeout<'a>(
        &'a self,
        key: &K,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<StripedReleaser<'a>, Error> {
        let Some(sem) = self.stripe(key) else {
            return Ok(StripedReleaser::inert());
        };
        match sem.try_acquire_timeout(Some(timeout), cancel).await {
            AcquireOutcome::Acquired => Ok(StripedReleaser::holding(sem)),
            AcquireOutcome::TimedOut => Ok(StripedReleaser::inert()),
            AcquireOutcome::Cancelled => Err(Error::Cancelled),
        }
    }

    pub async fn lock_or_none<'a>(
        &'a self,
        key: &K,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<StripedReleaser<'a>>, Error> {
        match self.lock_timeout(key, timeout, cancel).await {
            Ok(releaser) if releaser.entered() => Ok(Some(releaser)),
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn try_lock_with<F, Fut, T>(
        &self,
        key: &K,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
        f: F,
    ) -> Result<Option<T>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.lock_or_none(key, timeout, cancel).await? {
            Some(releaser) => {
                let result = f().await;
                drop(releaser);
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    pub async fn conditional_lock<'a>(&'a self, key: &K, condition: bool) -> StripedReleaser<'a> {
        if !condition {
            return StripedReleaser::inert();
        }
        self.lock(key).await
    }

    pub fn is_in_use(&self, key: &K) -> bool {
        self.stripe(key)
            .is_some_and(|sem| sem.available_permits() < self.max_count)
    }

    /// Permits currently held by whichever keys share this key's stripe.
    /// `0` when the table is empty: a no-op locker never holds anything.
    pub fn remaining_count(&self, key: &K) -> usize {
        self.max_count - self.current_count(key)
    }

    /// Permits still free on this key's stripe. `max_count` when the table
    /// is empty: a no-op locker behaves as if fully unheld.
    pub fn current_count(&self, key: &K) -> usize {
        self.stripe(key)
            .map(|sem| sem.available_permits())
            .unwrap_or(self.max_count)
    }

    pub fn number_of_stripes(&self) -> usize {
        self.table.len()
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }
}
