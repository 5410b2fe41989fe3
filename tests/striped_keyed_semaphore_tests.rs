//! Core operation-matrix tests for `StripedKeyedSemaphore`, mirroring the
//! counted variant's tests wherever the two share semantics — stripes are
//! permanent, so there is no registry/pool state to inspect, but mutual
//! exclusion, bounded concurrency, and the cancellation/timeout surface
//! behave identically.

use keyed_semaphore::{Error, StripedKeyedSemaphore, StripedKeyedSemaphoreOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn opts(max_count: usize, stripes: usize) -> StripedKeyedSemaphoreOptions {
    StripedKeyedSemaphoreOptions::new()
        .with_max_count(max_count)
        .with_number_of_stripes(stripes)
}

#[compio::test]
async fn mutual_exclusion_on_shared_stripe() {
    compio::time::timeout(Duration::from_secs(10), async {
        // A single stripe forces every key onto the same semaphore.
        let sks = Arc::new(StripedKeyedSemaphore::new(opts(1, 1)).unwrap());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for i in 0..30 {
            let sks = sks.clone();
            let inside = inside.clone();
            let max_observed = max_observed.clone();
            handles.push(compio::runtime::spawn(async move {
                let _g = sks.lock(&i).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(now, Ordering::SeqCst);
                compio::time::sleep(Duration::from_millis(1)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_observed.load(Ordering::SeqCst), 1);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn lock_then_drop_frees_the_stripe() {
    let sks = StripedKeyedSemaphore::new(opts(1, 8)).unwrap();
    let guard = sks.lock(&"a").await;
    assert!(sks.is_in_use(&"a"));
    drop(guard);
    assert!(!sks.is_in_use(&"a"));
}

#[compio::test]
async fn lock_timeout_reports_not_entered_without_consuming_a_permit() {
    let sks = StripedKeyedSemaphore::new(opts(1, 8)).unwrap();
    let held = sks.lock(&"a").await;

    let inner = sks
        .lock_timeout(&"a", Duration::from_millis(10), None)
        .await
        .unwrap();
    assert!(!inner.entered());
    drop(inner);

    drop(held);
    assert!(!sks.is_in_use(&"a"));
}

#[compio::test]
async fn cancelled_before_wait_short_circuits() {
    let sks = StripedKeyedSemaphore::new(opts(1, 8)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = sks.lock_cancellable(&"a", &cancel).await;
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(!sks.is_in_use(&"a"));
}

#[compio::test]
async fn conditional_lock_true_behaves_like_lock() {
    let sks = StripedKeyedSemaphore::new(opts(1, 8)).unwrap();
    let guard = sks.conditional_lock(&"a", true).await;
    assert!(guard.entered());
    assert!(sks.is_in_use(&"a"));
}

#[test]
fn stripe_count_realised_is_at_least_requested() {
    let sks: StripedKeyedSemaphore<&str> = StripedKeyedSemaphore::new(opts(1, 10)).unwrap();
    assert!(sks.number_of_stripes() >= 10);
    assert_eq!(sks.max_count(), 1);
}

#[test]
fn zero_stripes_is_accepted_at_construction() {
    let sks: StripedKeyedSemaphore<&str> = StripedKeyedSemaphore::new(opts(1, 0)).unwrap();
    assert_eq!(sks.number_of_stripes(), 0);
}

/// spec.md §4.6: `number_of_stripes == 0` disables the locker entirely —
/// every operation on it must be a no-op, never a panic.
#[compio::test]
async fn zero_stripes_makes_every_operation_a_no_op() {
    let sks: StripedKeyedSemaphore<&str> = StripedKeyedSemaphore::new(opts(1, 0)).unwrap();

    let guard = sks.lock(&"a").await;
    assert!(!guard.entered());
    drop(guard);

    assert!(!sks.is_in_use(&"a"));
    assert_eq!(sks.current_count(&"a"), 1);
    assert_eq!(sks.remaining_count(&"a"), 0);

    let timed = sks
        .lock_timeout(&"a", Duration::from_millis(10), None)
        .await
        .unwrap();
    assert!(!timed.entered());

    let none = sks
        .lock_or_none(&"a", Duration::from_millis(10), None)
        .await
        .unwrap();
    assert!(none.is_none());

    let cancel = CancellationToken::new();
    let cancellable = sks.lock_cancellable(&"a", &cancel).await.unwrap();
    assert!(!cancellable.entered());

    let conditional = sks.conditional_lock(&"a", true).await;
    assert!(!conditional.entered());
}
