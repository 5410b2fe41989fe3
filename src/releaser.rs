//! Releaser token (C3)
//!
//! The scoped-acquisition handle every successful acquire returns. Dropping
//! it — or calling [`Releaser::release`] explicitly — is the only way to
//! relinquish a permit. Both paths are safe to use together: release is
//! idempotent.

use crate::body::Body;
use crate::registry::Registry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Releaser for the reference-counted (counted) keyed locker.
///
/// A token with `entered == false` (returned on timeout from the
/// out-parameter-style operations) owns nothing: `release`/`Drop` are
/// no-ops for it.
#[must_use = "dropping the releaser immediately releases the lock; bind it to a variable to hold the lock for a scope"]
pub struct Releaser<K: Eq + std::hash::Hash + Clone + Send + Sync + 'static> {
    registry: Option<Arc<Registry<K>>>,
    body: Option<Arc<Body<K>>>,
    released: AtomicBool,
    entered: bool,
}

impl<K: Eq + std::hash::Hash + Clone + Send + Sync + 'static> Releaser<K> {
    pub(crate) fn holding(registry: Arc<Registry<K>>, body: Arc<Body<K>>) -> Self {
        body.mark_entered();
        Self {
            registry: Some(registry),
            body: Some(body),
            released: AtomicBool::new(false),
            entered: true,
        }
    }

    /// An inert releaser: owns no permit, `release`/`Drop` do nothing. Used
    /// for timed-out out-parameter acquires and for the skipped branch of
    /// `conditional_lock`.
    pub(crate) fn inert() -> Self {
        Self {
            registry: None,
            body: None,
            released: AtomicBool::new(true),
            entered: false,
        }
    }

    /// Whether the wait actually succeeded (`false` for the inert/timed-out
    /// case, mirroring the `entered` out-parameter in the operation matrix).
    pub fn entered(&self) -> bool {
        self.entered
    }

    /// Releases the held permit. Idempotent: a second call (or the
    /// subsequent `Drop`) is a no-op.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let (Some(registry), Some(body)) = (&self.registry, &self.body) {
            registry.release(body);
        }
    }
}

impl<K: Eq + std::hash::Hash + Clone + Send + Sync + 'static> Drop for Releaser<K> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Releaser for the striped keyed locker. Stripes are permanent, so release
/// only ever touches the semaphore — there is no refcount or pool to update.
#[must_use = "dropping the releaser immediately releases the lock; bind it to a variable to hold the lock for a scope"]
pub struct StripedReleaser<'a> {
    sem: Option<&'a crate::semaphore::CountingSemaphore>,
    released: AtomicBool,
    entered: bool,
}

impl<'a> StripedReleaser<'a> {
    pub(crate) fn holding(sem: &'a crate::semaphore::CountingSemaphore) -> Self {
        Self {
            sem: Some(sem),
            released: AtomicBool::new(false),
            entered: true,
        }
    }

    pub(crate) fn inert() -> Self {
        Self {
            sem: None,
            released: AtomicBool::new(true),
            entered: false,
        }
    }

    pub fn entered(&self) -> bool {
        self.entered
    }

    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(sem) = self.sem {
            sem.release_raw(1);
        }
    }
}

impl<'a> Drop for StripedReleaser<'a> {
    fn drop(&mut self) {
        self.release();
    }
}
