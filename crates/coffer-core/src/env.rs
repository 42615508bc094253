//! Environment abstraction for injectable time and delays.
//!
//! The `Environment` trait decouples the transfer protocol from the system
//! clock. The unsafe transfer variant contains a deliberate delay between
//! its two lock acquisitions, inserted purely to widen the window in which
//! the deadlock manifests. Routing that delay through `Environment` keeps
//! it tunable and lets tests swap the sleep for a deterministic rendezvous
//! (see the harness crate's `RendezvousEnv`).
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Isolation: implementations must not share global state

use std::time::{Duration, Instant};

/// Abstract environment providing time and async delays.
///
/// Protocol logic calls into this trait instead of `tokio::time` directly,
/// so that the timing behavior of a run is fully controlled by the caller.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: subsequent calls must return times >= previous calls
    ///   within a single execution context.
    fn now(&self) -> Instant;

    /// Suspends the calling task for the specified duration.
    ///
    /// This is the only async method in the trait. Implementations are free
    /// to interpret the duration loosely: a simulation environment may
    /// substitute a synchronization point (e.g. a barrier) for wall-clock
    /// waiting, as long as the method eventually resumes.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
