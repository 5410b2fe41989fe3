//! Platform-specific waiter queue implementations
//!
//! This module provides different implementations of waiter queues based on the
//! target platform to achieve optimal performance:
//!
//! - **Linux**: (Phase 2) Will use io_uring futex operations for unified event loop
//! - **Windows**: (Phase 3) Will use IOCP for unified event loop
//! - **Generic**: (Phase 1 - Current) Uses parking_lot mutex with hybrid single/multi mode
//!
//! **Current Status**: All platforms use the generic implementation (Phase 1).
//! Platform-specific optimizations will be added in Phase 2 (Linux) and Phase 3 (Windows).
//!
//! All implementations provide the same interface via `WaiterQueueTrait`, ensuring
//! consistent behavior across platforms while enabling platform-specific optimizations.

// Generic implementation - always compiled (used as baseline and fallback)
mod generic;

// Platform-specific modules
// Phase 1: These re-export generic implementation
// Phase 2+: Will have platform-specific optimizations
#[cfg(target_os = "linux")]
mod linux;

#[cfg(windows)]
mod windows;

// Re-export the appropriate implementation
#[cfg(target_os = "linux")]
pub use linux::WaiterQueue;

#[cfg(windows)]
pub use windows::WaiterQueue;

#[cfg(not(any(target_os = "linux", windows)))]
pub use generic::WaiterQueue;

// Common trait that all implementations satisfy (for testing and documentation)

/// Trait for waiter queue implementations
///
/// This trait defines the interface that all platform-specific waiter queue
/// implementations must satisfy.
pub trait WaiterQueueTrait {
    /// Create a new waiter queue
    fn new() -> Self;

    /// Add a waiter to the queue if condition is false (atomic check-and-add)
    ///
    /// Completes when either:
    /// - Condition was already true (fast path, no registration)
    /// - Waiter was registered and subsequently woken
    ///
    /// After awaiting, caller should re-check the actual condition.
    ///
    /// For io_uring, can return submit() future directly.
    /// For generic, returns immediately-ready future.
    ///
    /// **Note**: The returned future is `!Send` because io_uring operations are
    /// thread-local. This is fine for compio's single-threaded runtime model.
    fn add_waiter_if<'a, F>(&'a self, condition: F) -> impl std::future::Future<Output = ()>
    where
        F: Fn() -> bool + Send + Sync + 'a;

    /// Wake one waiting task
    ///
    /// **Ordering**: Wake order is implementation-dependent and NOT guaranteed to be FIFO.
    /// - Generic: FIFO (uses parking_lot queue)
    /// - io_uring: Unspecified (kernel scheduling)
    fn wake_one(&self);

    /// Wake all waiting tasks
    ///
    /// **Ordering**: Wake order is implementation-dependent and NOT guaranteed to be FIFO.
    /// All waiters will be woken, but in an unspecified order.
    fn wake_all(&self);

    /// Get the number of waiting tasks (for debugging/stats)
    #[allow(dead_code)]
    fn waiter_count(&self) -> usize;
}
