//! Keyed semaphores for the compio async runtime.
//!
//! Many concurrent tasks need mutual exclusion or bounded concurrency keyed
//! by some runtime value (a user id, a file path, a cache key) without the
//! caller having to allocate, share, and tear down a distinct semaphore for
//! each key by hand. This crate provides two lockers that do that
//! bookkeeping internally:
//!
//! - [`KeyedSemaphore`] — reference-counted: a key's body exists only while
//!   at least one task holds or waits on it, then is reclaimed (optionally
//!   through a reuse pool).
//! - [`StripedKeyedSemaphore`] — fixed-size: keys hash into one of a small,
//!   constant number of permanent semaphores, trading perfect per-key
//!   isolation for zero per-key allocation.
//!
//! # Example
//!
//! ```rust,no_run
//! use keyed_semaphore::{KeyedSemaphore, KeyedSemaphoreOptions};
//!
//! #[compio::main]
//! async fn main() {
//!     let locks = KeyedSemaphore::new(KeyedSemaphoreOptions::new()).unwrap();
//!
//!     // Two different keys never contend with each other.
//!     let _a = locks.lock("user:1").await;
//!     let _b = locks.lock("user:2").await;
//! }
//! ```

mod body;
mod error;
mod keyed;
mod options;
mod pool;
mod prime;
mod registry;
mod releaser;
mod semaphore;
mod stripe;

// Platform-specific waiter queue implementation backing the counting
// semaphore wrapper (C2).
mod waiter_queue;

pub use error::Error;
pub use keyed::{AwaitOptions, KeyedSemaphore, StripedKeyedSemaphore};
pub use options::{KeyedSemaphoreOptions, StripedKeyedSemaphoreOptions};
pub use pool::PoolInitialFill;
pub use prime::{get_prime, is_prime};
pub use releaser::{Releaser, StripedReleaser};
