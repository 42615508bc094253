//! Load harness for the coffer transfer protocol.
//!
//! This crate drives many concurrent transfers against a [`Bank`] and
//! observes the global outcome: either every dispatched operation returns
//! within a bounded observation window (`Completed`), or the window elapses
//! first (`Stalled`). A stall is the external signature of a deadlock; the
//! harness can observe and report it but cannot recover the blocked tasks.
//!
//! # Why an external observer?
//!
//! A task caught in a circular wait never returns, throws nothing, and
//! cannot report its own demise. The only vantage point from which a
//! deadlock is visible is outside the blocked tasks, watching the set of
//! dispatched operations against a clock. The harness is deliberately
//! minimal for the same reason: it only dispatches and waits. Any extra
//! synchronization between the transfer tasks could mask the deadlock (by
//! serializing them) or force one (by creating new wait edges).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::{sync::Arc, time::Duration};
//! use coffer_core::Bank;
//! use coffer_harness::{LoadPlan, SystemEnv, Variant, run_plan};
//!
//! let bank = Arc::new(Bank::new(100, 1_000));
//! let plan = LoadPlan::random(42, bank.len(), 10_000, 1)?;
//! let report = run_plan(
//!     SystemEnv::new(),
//!     Arc::clone(&bank),
//!     Variant::PositionOrder,
//!     plan,
//!     Duration::from_secs(5),
//! ).await?;
//! assert!(report.outcome.is_completed());
//! assert_eq!(report.conserved(), Some(true));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod env;
mod load;
mod plan;

pub use env::{RendezvousEnv, SystemEnv};
pub use load::{HarnessError, Outcome, RunReport, Variant, run_plan, run_random};
pub use plan::LoadPlan;
