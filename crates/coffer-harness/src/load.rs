//! Dispatching concurrent transfers and observing the outcome.
//!
//! A run moves through three states: `Idle` (plan built, nothing launched),
//! `Dispatching` (all transfer tasks spawned), and finally `Completed` or
//! `Stalled`. `Stalled` is a terminal diagnostic, not a retryable error:
//! the observation window elapsed with tasks still blocked, and nothing the
//! harness can do will unblock them. The stalled tasks are *detached*, not
//! aborted, so the harness remains a pure observer; they stay parked on
//! their mutexes until the runtime shuts down.
//!
//! Stall detection via a timeout is inherently racy: a slow-but-live run
//! can look stalled. The window is a tunable test parameter, not a hard
//! correctness boundary.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use coffer_core::{Bank, Environment, TransferError};
use tokio::task::JoinSet;

use crate::plan::LoadPlan;

/// Which locking discipline a run exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Caller-order locking (`Bank::transfer_unsafe`): deadlock-prone.
    ///
    /// `race_window` is the artificial delay held between the two lock
    /// acquisitions to widen the window in which the deadlock manifests.
    CallerOrder {
        /// Delay between first and second lock acquisition.
        race_window: Duration,
    },

    /// Canonical position-order locking (`Bank::transfer_ordered`):
    /// deadlock-free.
    PositionOrder,
}

/// Terminal state of a load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every dispatched transfer returned within the observation window.
    Completed {
        /// Wall time from dispatch to last completion.
        elapsed: Duration,
    },

    /// The observation window elapsed with transfers still outstanding.
    ///
    /// The signature of a deadlock under the caller-order variant. The
    /// blocked tasks are unrecoverable; this is a report, not an error.
    Stalled {
        /// Transfers that did finish before the window closed.
        finished: usize,
        /// Transfers that were dispatched.
        dispatched: usize,
    },
}

impl Outcome {
    /// Whether the run completed within its window.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Whether the run stalled.
    pub fn is_stalled(&self) -> bool {
        !self.is_completed()
    }
}

/// Result of a load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Terminal state of the run.
    pub outcome: Outcome,
    /// Total bank balance before dispatch.
    pub total_before: i64,
    /// Total bank balance after completion; `None` if the run stalled
    /// (reading totals while tasks still hold locks would block too).
    pub total_after: Option<i64>,
}

impl RunReport {
    /// The closing conservation check: `Some(true)` if the run completed
    /// and the total balance is unchanged, `Some(false)` if it completed
    /// and value was created or destroyed, `None` if the run stalled.
    pub fn conserved(&self) -> Option<bool> {
        self.total_after.map(|after| after == self.total_before)
    }
}

/// Structural harness failures.
///
/// A stall is deliberately *not* represented here: liveness failures are
/// reported through [`Outcome`], never as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The plan contained no transfers.
    #[error("load plan is empty; nothing to dispatch")]
    EmptyPlan,

    /// The bank is too small to form a distinct source/destination pair.
    #[error("bank of {accounts} accounts cannot form a distinct transfer pair")]
    PoolTooSmall {
        /// Number of accounts in the bank.
        accounts: usize,
    },

    /// A transfer returned a structural error. Plans generated by
    /// [`LoadPlan::random`] never trigger this; a scripted plan with bad
    /// positions will.
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// A transfer task panicked or was cancelled.
    #[error("transfer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Dispatches every transfer in `plan` as its own concurrent task and waits
/// up to `window` for all of them to return.
///
/// The harness adds no synchronization between the transfer tasks beyond
/// spawn and join, so it neither masks a deadlock nor forces one. On
/// completion it re-reads the bank's total balance as the closing
/// conservation check; on a stall it detaches the outstanding tasks and
/// reports how many finished.
///
/// # Errors
///
/// Returns an error only for structural failures (empty plan, a transfer
/// rejecting its input, a panicked task). A stall is a successful
/// observation: `Ok` with [`Outcome::Stalled`].
pub async fn run_plan<E: Environment>(
    env: E,
    bank: Arc<Bank>,
    variant: Variant,
    plan: LoadPlan,
    window: Duration,
) -> Result<RunReport, HarnessError> {
    let dispatched = plan.len();
    if dispatched == 0 {
        return Err(HarnessError::EmptyPlan);
    }

    let total_before = bank.total_balance().await;
    tracing::debug!(dispatched, ?variant, ?window, "dispatching transfers");

    let finished = Arc::new(AtomicUsize::new(0));
    let mut tasks = JoinSet::new();
    for transfer in plan {
        let bank = Arc::clone(&bank);
        let env = env.clone();
        let finished = Arc::clone(&finished);
        tasks.spawn(async move {
            let result = match variant {
                Variant::CallerOrder { race_window } => {
                    bank.transfer_unsafe(&env, transfer, race_window).await
                },
                Variant::PositionOrder => bank.transfer_ordered(transfer).await,
            };
            if result.is_ok() {
                finished.fetch_add(1, Ordering::Relaxed);
            }
            result
        });
    }

    let started = env.now();
    let drained = tokio::time::timeout(window, async {
        while let Some(joined) = tasks.join_next().await {
            joined??;
        }
        Ok::<(), HarnessError>(())
    })
    .await;

    match drained {
        Ok(result) => {
            result?;
            let elapsed = env.now() - started;
            let total_after = bank.total_balance().await;
            tracing::info!(dispatched, ?elapsed, total_after, "run completed");
            Ok(RunReport {
                outcome: Outcome::Completed { elapsed },
                total_before,
                total_after: Some(total_after),
            })
        },
        Err(_elapsed) => {
            let finished = finished.load(Ordering::Relaxed);
            tracing::warn!(finished, dispatched, "run stalled: observation window elapsed");
            // Leave the blocked tasks parked; aborting them would make the
            // harness a participant instead of an observer.
            tasks.detach_all();
            Ok(RunReport {
                outcome: Outcome::Stalled { finished, dispatched },
                total_before,
                total_after: None,
            })
        },
    }
}

/// Convenience wrapper: generates a seeded random plan over the bank's
/// accounts and runs it.
///
/// # Errors
///
/// As [`run_plan`], plus [`HarnessError::PoolTooSmall`] if the bank has
/// fewer than two accounts.
pub async fn run_random<E: Environment>(
    env: E,
    bank: Arc<Bank>,
    variant: Variant,
    seed: u64,
    count: usize,
    amount: i64,
    window: Duration,
) -> Result<RunReport, HarnessError> {
    let plan = LoadPlan::random(seed, bank.len(), count, amount)?;
    run_plan(env, bank, variant, plan, window).await
}
