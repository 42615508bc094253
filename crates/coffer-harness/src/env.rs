//! Environment implementations for the harness.
//!
//! Two implementations of `coffer_core::Environment`:
//!
//! - [`SystemEnv`]: production behavior, real clock and real sleeps. Used
//!   for timing-based deadlock reproduction, where the race-widening delay
//!   is an actual wall-clock wait.
//! - [`RendezvousEnv`]: replaces the delay with a barrier rendezvous, so a
//!   deadlock scenario becomes deterministic: no task proceeds to its
//!   second lock until every participant holds its first. Timing-based
//!   races reproduce the bug with high probability; the rendezvous
//!   reproduces it with certainty.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use coffer_core::Environment;
use tokio::sync::Barrier;

/// Production environment: system clock, `tokio::time::sleep`.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Deterministic environment whose "sleep" is a barrier rendezvous.
///
/// Constructed with the number of participating tasks. Each call to
/// `sleep` waits on the shared barrier instead of the clock, so in a
/// two-task swapped-pair scenario both tasks are guaranteed to hold their
/// first lock before either requests its second. The requested duration is
/// ignored.
///
/// Use only when every participant calls `sleep` exactly once per
/// rendezvous round; a participant that never reaches the barrier leaves
/// the others waiting.
#[derive(Clone)]
pub struct RendezvousEnv {
    barrier: Arc<Barrier>,
}

impl RendezvousEnv {
    /// Creates a rendezvous for `participants` tasks.
    #[must_use]
    pub fn new(participants: usize) -> Self {
        Self { barrier: Arc::new(Barrier::new(participants)) }
    }
}

impl Environment for RendezvousEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let barrier = Arc::clone(&self.barrier);
        async move {
            barrier.wait().await;
        }
    }
}
