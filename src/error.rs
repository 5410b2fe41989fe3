//! Error taxonomy for keyed semaphore construction and acquisition
//!
//! See the crate-level docs for the full propagation policy: validation
//! fails fast at construction, cancellation and caller-callback errors
//! surface to the caller, and disposal/pool races are absorbed silently.

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Construction-time validation failure (`max_count < 1`, `pool_size < 0`,
    /// `pool_initial_fill` outside `[-1, pool_size]`, negative stripe count).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller's cancellation token fired before or during a wait.
    #[error("operation cancelled")]
    Cancelled,
}
