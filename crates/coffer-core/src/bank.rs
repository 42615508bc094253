//! Accounts and the fixed pool that owns them.
//!
//! ## Design
//!
//! - One mutex per account: each account's lock is the sole arbiter of
//!   mutation rights over its balance. There is no global lock; a global
//!   lock would serialize all transfers and trivially mask the deadlock
//!   this crate exists to demonstrate.
//! - Fixed pool: the bank's account list is built once and never resized,
//!   so the *structure* (which accounts exist, at which positions) can be
//!   read without locking. Position stability is what makes "lock in
//!   position order" well-defined.

use tokio::sync::{Mutex, MutexGuard};

/// A single account: a stable identity and a mutex-guarded balance.
///
/// The balance is a signed integer and the protocol does not enforce
/// non-negativity: transfers may drive a balance negative. The crate models
/// lock discipline, not account policy.
#[derive(Debug)]
pub struct Account {
    id: usize,
    balance: Mutex<i64>,
}

impl Account {
    fn new(id: usize, balance: i64) -> Self {
        Self { id, balance: Mutex::new(balance) }
    }

    /// Stable identity of this account; equals its position in the bank.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Acquires this account's balance lock, suspending until available.
    pub async fn lock(&self) -> MutexGuard<'_, i64> {
        self.balance.lock().await
    }
}

/// A fixed, position-addressed pool of accounts.
///
/// Accounts are owned exclusively by the bank and addressed by their
/// position `0..len()`. The pool never grows or shrinks after construction.
#[derive(Debug)]
pub struct Bank {
    accounts: Vec<Account>,
}

impl Bank {
    /// Creates a bank of `accounts` accounts, each starting at
    /// `initial_balance`, ids `0..accounts`.
    pub fn new(accounts: usize, initial_balance: i64) -> Self {
        let accounts = (0..accounts).map(|id| Account::new(id, initial_balance)).collect();
        Self { accounts }
    }

    /// Number of accounts in the bank.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the bank holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// The account at `position`, or `None` if out of range.
    pub fn account(&self, position: usize) -> Option<&Account> {
        self.accounts.get(position)
    }

    /// Current balance of the account at `position`.
    ///
    /// Takes and releases that account's lock; returns `None` if the
    /// position is out of range.
    pub async fn balance(&self, position: usize) -> Option<i64> {
        match self.accounts.get(position) {
            Some(account) => Some(*account.lock().await),
            None => None,
        }
    }

    /// Sum of all balances.
    ///
    /// Locks accounts one at a time in position order, so the result is
    /// exact only when no transfers are in flight. The harness uses it as
    /// a closing conservation check after all dispatched transfers have
    /// returned.
    pub async fn total_balance(&self) -> i64 {
        let mut total = 0i64;
        for account in &self.accounts {
            total += *account.lock().await;
        }
        total
    }
}
