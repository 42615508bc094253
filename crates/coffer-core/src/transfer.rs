//! The two-lock transfer protocol.
//!
//! Both variants perform the same pair of mutations (debit source, credit
//! destination) while holding both account locks, so each transfer is
//! atomic with respect to any observer that also locks before reading.
//! They differ only in *lock acquisition order*, which is exactly the
//! difference between a protocol that deadlocks under contention and one
//! that cannot:
//!
//! - Caller order ([`Bank::transfer_unsafe`]): source lock first. Two
//!   concurrent transfers over a swapped pair each hold one lock and wait
//!   on the other, forever.
//! - Position order ([`Bank::transfer_ordered`]): lower position's lock
//!   first, always. Every operation that needs locks `i` and `j` with
//!   `i < j` acquires `i` before `j`, so no operation can hold `j` while
//!   waiting on `i` and the wait-for graph over any pair stays acyclic.

use std::time::Duration;

use crate::{Account, Bank, Environment, TransferError};

/// A transfer request: move `amount` from the account at `from` to the
/// account at `to`.
///
/// Transient by design: a transfer is never stored, only executed. Negative
/// amounts are not rejected (they simply move value the other way); see the
/// crate docs for the overdraft policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Source position (debited).
    pub from: usize,
    /// Destination position (credited).
    pub to: usize,
    /// Amount to move.
    pub amount: i64,
}

impl Transfer {
    /// Convenience constructor.
    pub fn new(from: usize, to: usize, amount: i64) -> Self {
        Self { from, to, amount }
    }
}

/// Canonical lock-acquisition order for a pair of positions.
///
/// Returns the pair sorted ascending. The result is independent of which
/// side is source and which is destination, which is the property that
/// makes the ordered variant deadlock-free. Callers must not pass equal
/// positions; transfers reject those before ordering is computed.
pub fn lock_order(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Bank {
    /// Validates a transfer's positions and returns the account pair.
    fn checked_pair(&self, transfer: Transfer) -> Result<(&Account, &Account), TransferError> {
        if transfer.from == transfer.to {
            return Err(TransferError::SelfTransfer { position: transfer.from });
        }
        let from = self
            .account(transfer.from)
            .ok_or(TransferError::PositionOutOfRange {
                position: transfer.from,
                accounts: self.len(),
            })?;
        let to = self
            .account(transfer.to)
            .ok_or(TransferError::PositionOutOfRange {
                position: transfer.to,
                accounts: self.len(),
            })?;
        Ok((from, to))
    }

    /// Transfers with locks acquired in **caller order**: source first,
    /// destination second.
    ///
    /// This is the negative example. Run concurrently with a transfer over
    /// the swapped pair, each task acquires its source lock, then blocks
    /// forever on the other's held lock: a circular wait with no recovery.
    /// The `race_window` sleep between the two acquisitions exists solely
    /// to widen the timing window in which the deadlock manifests; it has
    /// no other semantic meaning and goes through [`Environment`] so tests
    /// can replace it with a deterministic rendezvous.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] for out-of-range positions or a
    /// self-transfer, before any lock is taken. A deadlock is not an error:
    /// the task simply never returns.
    pub async fn transfer_unsafe<E: Environment>(
        &self,
        env: &E,
        transfer: Transfer,
        race_window: Duration,
    ) -> Result<(), TransferError> {
        let (from, to) = self.checked_pair(transfer)?;

        tracing::trace!(from = transfer.from, to = transfer.to, amount = transfer.amount,
            "caller-order transfer: locking source");
        let mut src = from.lock().await;
        env.sleep(race_window).await;
        tracing::trace!(from = transfer.from, to = transfer.to, "caller-order transfer: locking destination");
        let mut dst = to.lock().await;

        *src -= transfer.amount;
        *dst += transfer.amount;

        // Release in reverse acquisition order.
        drop(dst);
        drop(src);
        Ok(())
    }

    /// Transfers with locks acquired in **canonical position order**: the
    /// lower position's lock first, regardless of which side is the source.
    ///
    /// After both locks are held, the debit and credit use the *original*
    /// source/destination roles; only the lock order is canonicalized.
    /// Locks are released in reverse acquisition order. Any number of
    /// concurrent ordered transfers preserve the bank's total balance and
    /// can never form a circular wait.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] for out-of-range positions or a
    /// self-transfer, before any lock is taken.
    pub async fn transfer_ordered(&self, transfer: Transfer) -> Result<(), TransferError> {
        let (from, to) = self.checked_pair(transfer)?;

        let (first, second) =
            if transfer.from < transfer.to { (from, to) } else { (to, from) };

        tracing::trace!(from = transfer.from, to = transfer.to, amount = transfer.amount,
            first = first.id(), "position-order transfer: locking pair");
        let mut first_guard = first.lock().await;
        let mut second_guard = second.lock().await;

        // Lock order is canonical; debit/credit roles are not.
        let (src, dst) = if transfer.from < transfer.to {
            (&mut *first_guard, &mut *second_guard)
        } else {
            (&mut *second_guard, &mut *first_guard)
        };
        *src -= transfer.amount;
        *dst += transfer.amount;

        drop(second_guard);
        drop(first_guard);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Instant};

    use proptest::prelude::*;

    use super::*;

    /// Minimal environment for tests: real clock, real (tokio) sleep.
    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        fn now(&self) -> Instant {
            Instant::now()
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            tokio::time::sleep(duration)
        }
    }

    #[tokio::test]
    async fn ordered_transfer_moves_value() {
        let bank = Bank::new(2, 1000);

        bank.transfer_ordered(Transfer::new(0, 1, 100)).await.unwrap();

        assert_eq!(bank.balance(0).await, Some(900));
        assert_eq!(bank.balance(1).await, Some(1100));
    }

    #[tokio::test]
    async fn ordered_transfer_roles_survive_reordering() {
        // from > to: lock order flips, debit/credit must not.
        let bank = Bank::new(2, 1000);

        bank.transfer_ordered(Transfer::new(1, 0, 100)).await.unwrap();

        assert_eq!(bank.balance(0).await, Some(1100));
        assert_eq!(bank.balance(1).await, Some(900));
    }

    #[tokio::test]
    async fn unsafe_transfer_is_arithmetically_correct_when_uncontended() {
        // The caller-order variant is wrong only in liveness, not arithmetic.
        let bank = Bank::new(2, 1000);

        bank.transfer_unsafe(&TestEnv, Transfer::new(0, 1, 300), Duration::ZERO).await.unwrap();

        assert_eq!(bank.balance(0).await, Some(700));
        assert_eq!(bank.balance(1).await, Some(1300));
    }

    #[tokio::test]
    async fn self_transfer_is_rejected_before_locking() {
        let bank = Bank::new(2, 1000);

        let err = bank.transfer_ordered(Transfer::new(1, 1, 50)).await.unwrap_err();
        assert_eq!(err, TransferError::SelfTransfer { position: 1 });

        let err =
            bank.transfer_unsafe(&TestEnv, Transfer::new(0, 0, 50), Duration::ZERO).await.unwrap_err();
        assert_eq!(err, TransferError::SelfTransfer { position: 0 });

        // Balances untouched.
        assert_eq!(bank.total_balance().await, 2000);
        assert_eq!(bank.balance(0).await, Some(1000));
    }

    #[tokio::test]
    async fn out_of_range_position_is_rejected() {
        let bank = Bank::new(2, 1000);

        let err = bank.transfer_ordered(Transfer::new(0, 5, 50)).await.unwrap_err();
        assert_eq!(err, TransferError::PositionOutOfRange { position: 5, accounts: 2 });

        let err = bank.transfer_ordered(Transfer::new(7, 0, 50)).await.unwrap_err();
        assert_eq!(err, TransferError::PositionOutOfRange { position: 7, accounts: 2 });

        assert_eq!(bank.total_balance().await, 2000);
    }

    #[tokio::test]
    async fn negative_amounts_and_overdrafts_are_permitted() {
        // Documented policy: the protocol models lock discipline, not
        // account policy. A negative amount moves value the other way and
        // balances may go negative.
        let bank = Bank::new(2, 100);

        bank.transfer_ordered(Transfer::new(0, 1, -40)).await.unwrap();
        assert_eq!(bank.balance(0).await, Some(140));
        assert_eq!(bank.balance(1).await, Some(60));

        bank.transfer_ordered(Transfer::new(1, 0, 500)).await.unwrap();
        assert_eq!(bank.balance(1).await, Some(-440));
        assert_eq!(bank.total_balance().await, 200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_swapped_pair_is_exact() {
        // {1000, 1000}, concurrent (0→1, 100) and (1→0, 50) must end at
        // exactly {950, 1050} regardless of interleaving.
        let bank = Arc::new(Bank::new(2, 1000));

        let a = tokio::spawn({
            let bank = Arc::clone(&bank);
            async move { bank.transfer_ordered(Transfer::new(0, 1, 100)).await }
        });
        let b = tokio::spawn({
            let bank = Arc::clone(&bank);
            async move { bank.transfer_ordered(Transfer::new(1, 0, 50)).await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(bank.balance(0).await, Some(950));
        assert_eq!(bank.balance(1).await, Some(1050));
    }

    #[test]
    fn lock_order_sorts_ascending() {
        assert_eq!(lock_order(0, 1), (0, 1));
        assert_eq!(lock_order(1, 0), (0, 1));
        assert_eq!(lock_order(42, 7), (7, 42));
    }

    proptest! {
        /// The computed lock order must be identical for (i, j) and (j, i):
        /// only the debit/credit roles swap, never the acquisition order.
        #[test]
        fn prop_lock_order_is_direction_independent(i in 0usize..10_000, j in 0usize..10_000) {
            prop_assume!(i != j);

            let forward = lock_order(i, j);
            let backward = lock_order(j, i);

            prop_assert_eq!(forward, backward);
            prop_assert!(forward.0 < forward.1);
        }
    }
}
