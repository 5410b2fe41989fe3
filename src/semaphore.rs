//! Counting semaphore wrapper (C2)
//!
//! The registry (C5) and stripe table (C6) both hold one of these per
//! semaphore body. It is the only primitive in this crate that ever
//! suspends a task: everything above this layer (refcounting, pool
//! rent/return, registry lookups) is non-blocking.
//!
//! This is a thin generalization of the host runtime's counting semaphore:
//! a lock-free fast path for the uncontended case, FIFO waiters via
//! [`WaiterQueue`] for the contended case, and uniform timeout/cancellation
//! handling layered on top for [`try_acquire_timeout`](CountingSemaphoreGeneric::try_acquire_timeout).

use crate::waiter_queue::{WaiterQueue, WaiterQueueTrait};
use futures_util::future::{select, Either};
use futures_util::pin_mut;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome of a timed/cancellable wait, matching the host-runtime contract
/// C2 wraps: exactly one of `Acquired`, `TimedOut`, `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AcquireOutcome {
    Acquired,
    TimedOut,
    Cancelled,
}

/// Generic counting semaphore parameterized over the waiter-queue backend,
/// mirroring the platform-selection pattern used throughout this crate.
pub(crate) struct CountingSemaphoreGeneric<W: WaiterQueueTrait> {
    permits: AtomicUsize,
    max_permits: usize,
    waiters: W,
}

/// The platform-selected counting semaphore used everywhere in this crate.
pub(crate) type CountingSemaphore = CountingSemaphoreGeneric<WaiterQueue>;

impl<W: WaiterQueueTrait> CountingSemaphoreGeneric<W> {
    /// Creates a semaphore with `permits` initial permits.
    ///
    /// # Panics
    /// Panics if `permits == 0`. Callers that need to surface this as
    /// `Error::InvalidArgument` (the keyed-locker constructors) validate
    /// `max_count >= 1` themselves before ever reaching this constructor.
    pub(crate) fn new(permits: usize) -> Self {
        assert!(permits > 0, "semaphore body must have at least one permit");
        Self {
            permits: AtomicUsize::new(permits),
            max_permits: permits,
            waiters: W::new(),
        }
    }

    /// Non-blocking attempt to take one permit.
    pub(crate) fn try_acquire_raw(&self) -> bool {
        let mut current = self.permits.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.permits.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Releases `count` permits and wakes up to `count` waiters.
    pub(crate) fn release_raw(&self, count: usize) {
        self.permits.fetch_add(count, Ordering::Release);
        for _ in 0..count {
            self.waiters.wake_one();
        }
    }

    pub(crate) fn available_permits(&self) -> usize {
        self.permits.load(Ordering::Acquire)
    }

    pub(crate) fn max_permits(&self) -> usize {
        self.max_permits
    }

    /// Waits, without a deadline or cancellation, until a permit is free.
    pub(crate) async fn acquire_raw(&self) {
        loop {
            if self.try_acquire_raw() {
                return;
            }
            // add_waiter_if rechecks the condition after registering, so no
            // permit released between our failed try and the registration
            // is lost (see `waiter_queue::WaiterQueueTrait` for the proof).
            self.waiters
                .add_waiter_if(|| self.permits.load(Ordering::Acquire) > 0)
                .await;
        }
    }

    /// Waits until a permit is free or `cancel` fires, whichever is first.
    ///
    /// Pre-fired tokens are checked before any state is touched, matching
    /// the "cancellation purity" contract: a cancelled acquire never takes
    /// a permit and never registers a waiter.
    pub(crate) async fn acquire_cancellable_raw(&self, cancel: &CancellationToken) -> AcquireOutcome {
        if cancel.is_cancelled() {
            return AcquireOutcome::Cancelled;
        }
        loop {
            if self.try_acquire_raw() {
                return AcquireOutcome::Acquired;
            }
            let wait = self
                .waiters
                .add_waiter_if(|| self.permits.load(Ordering::Acquire) > 0);
            pin_mut!(wait);
            let cancelled = cancel.cancelled();
            pin_mut!(cancelled);
            match select(wait, cancelled).await {
                Either::Left(_) => continue,
                Either::Right(_) => return AcquireOutcome::Cancelled,
            }
        }
    }

    /// The single entry point the acquire orchestrator (C7) drives: a
    /// non-blocking try (`timeout == Some(Duration::ZERO)`), an infinite
    /// wait (`timeout.is_none()`), or a timed wait, each optionally
    /// cancellable.
    pub(crate) async fn try_acquire_timeout(
        &self,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> AcquireOutcome {
        if let Some(c) = cancel {
            if c.is_cancelled() {
                return AcquireOutcome::Cancelled;
            }
        }

        if timeout == Some(Duration::ZERO) {
            return if self.try_acquire_raw() {
                AcquireOutcome::Acquired
            } else {
                AcquireOutcome::TimedOut
            };
        }

        let wait = async {
            match cancel {
                Some(c) => self.acquire_cancellable_raw(c).await,
                None => {
                    self.acquire_raw().await;
                    AcquireOutcome::Acquired
                }
            }
        };

        match timeout {
            None => wait.await,
            Some(d) => compio::time::timeout(d, wait)
                .await
                .unwrap_or(AcquireOutcome::TimedOut),
        }
    }
}
