//! Core locking protocol for concurrent value transfers.
//!
//! This crate models a bank of accounts where each account's balance is
//! guarded by its own mutex, and provides two transfer disciplines over
//! pairs of accounts:
//!
//! - [`Bank::transfer_unsafe`] acquires the two locks in *caller* order
//!   (source first, destination second). Two concurrent transfers with
//!   swapped endpoints each take their first lock and then wait forever on
//!   the other's: a textbook circular wait.
//! - [`Bank::transfer_ordered`] acquires the two locks in canonical
//!   *position* order (lower position first). Every transfer touching the
//!   same pair requests the locks in the same global order, so no cycle
//!   can form in the wait-for graph.
//!
//! ## Architecture
//!
//! ```text
//! coffer-core
//!   ├─ Environment       (time + sleep abstraction, injectable in tests)
//!   ├─ Account           (id + mutex-guarded balance)
//!   ├─ Bank              (fixed, position-addressed pool of accounts)
//!   └─ transfer_*        (the two locking disciplines)
//! ```
//!
//! The crate is runtime-agnostic: it depends on `tokio::sync` only, and the
//! single suspension point other than lock acquisition (the race-widening
//! delay in the unsafe variant) goes through the [`Environment`] trait so
//! tests can replace it with a deterministic rendezvous.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bank;
mod env;
mod error;
mod transfer;

pub use bank::{Account, Bank};
pub use env::Environment;
pub use error::TransferError;
pub use transfer::{Transfer, lock_order};
