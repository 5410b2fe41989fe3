//! Windows-specific waiter queue implementation using IOCP
//!
//! This implementation provides a unified event loop on Windows by posting
//! completion notifications to IOCP, allowing both I/O and synchronization
//! to be handled through the same completion port.
//!
//! Requirements:
//! - Windows 8+ (for NtAssociateWaitCompletionPacket)
//! - compio runtime with IOCP support
//!
//! Fallback: If requirements not met, falls back to generic implementation

// TODO: Phase 3 implementation
// For now, re-export generic implementation

pub use super::generic::WaiterQueue;

// Future implementation will look like:
/*
use std::sync::Arc;
use std::task::Waker;

pub struct WaiterQueue {
    /// Handle to compio's IOCP instance
    iocp: Arc<IocpHandle>,
}

impl WaiterQueue {
    pub fn new() -> Self {
        // Try to get IOCP handle from compio
        // If unavailable or Windows too old, fall back to generic
        todo!("Phase 3: Implement IOCP integration")
    }

    pub fn add_waiter_if<F>(&self, condition: F, waker: Waker) -> bool
    where
        F: FnOnce() -> bool,
    {
        // Fast path: try atomic CAS
        if condition() {
            return true;
        }

        // Slow path: associate event with IOCP
        // or use PostQueuedCompletionStatus
        todo!("Phase 3: Integrate with IOCP")
    }

    pub fn wake_one(&self) {
        // Post completion status to IOCP
        todo!("Phase 3: PostQueuedCompletionStatus")
    }

    pub fn wake_all(&self) {
        // Post multiple completion statuses
        todo!("Phase 3: PostQueuedCompletionStatus multiple")
    }

    pub fn waiter_count(&self) -> usize {
        // For IOCP implementation, we don't track count
        0
    }
}
*/

