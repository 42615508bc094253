//! Seeded generation of load plans.
//!
//! A load plan is the full list of transfers a run will dispatch, generated
//! up front from a seed so that every run is reproducible. Generating the
//! plan before dispatch also keeps randomness out of the transfer tasks
//! themselves: the harness stays a pure dispatcher.

use coffer_core::Transfer;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::load::HarnessError;

/// A pre-generated sequence of transfers for one load run.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    transfers: Vec<Transfer>,
}

impl LoadPlan {
    /// Generates `count` transfers of `amount` between random *distinct*
    /// positions in `0..accounts`, deterministically from `seed`.
    ///
    /// Self-pairs are re-rolled, never emitted: the protocol rejects them
    /// and a load run should exercise locking, not input validation.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::PoolTooSmall`] if `accounts < 2` (no
    /// distinct pair exists).
    pub fn random(
        seed: u64,
        accounts: usize,
        count: usize,
        amount: i64,
    ) -> Result<Self, HarnessError> {
        if accounts < 2 {
            return Err(HarnessError::PoolTooSmall { accounts });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let transfers = (0..count)
            .map(|_| {
                let from = rng.gen_range(0..accounts);
                let to = loop {
                    let candidate = rng.gen_range(0..accounts);
                    if candidate != from {
                        break candidate;
                    }
                };
                Transfer::new(from, to, amount)
            })
            .collect();

        Ok(Self { transfers })
    }

    /// Builds a plan from explicit transfers (for scripted scenarios).
    pub fn from_transfers(transfers: Vec<Transfer>) -> Self {
        Self { transfers }
    }

    /// The transfers in dispatch order.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Number of transfers in the plan.
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

impl IntoIterator for LoadPlan {
    type Item = Transfer;
    type IntoIter = std::vec::IntoIter<Transfer>;

    fn into_iter(self) -> Self::IntoIter {
        self.transfers.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_pairs_are_distinct_and_in_bounds() {
        let plan = LoadPlan::random(7, 10, 500, 1).unwrap();

        assert_eq!(plan.len(), 500);
        for transfer in plan.transfers() {
            assert_ne!(transfer.from, transfer.to);
            assert!(transfer.from < 10);
            assert!(transfer.to < 10);
            assert_eq!(transfer.amount, 1);
        }
    }

    #[test]
    fn plan_is_deterministic_for_a_seed() {
        let a = LoadPlan::random(42, 100, 1000, 5).unwrap();
        let b = LoadPlan::random(42, 100, 1000, 5).unwrap();

        assert_eq!(a.transfers(), b.transfers());
    }

    #[test]
    fn different_seeds_differ() {
        let a = LoadPlan::random(1, 100, 1000, 5).unwrap();
        let b = LoadPlan::random(2, 100, 1000, 5).unwrap();

        assert_ne!(a.transfers(), b.transfers());
    }

    #[test]
    fn single_account_pool_is_rejected() {
        let err = LoadPlan::random(0, 1, 10, 1).unwrap_err();

        assert!(matches!(err, HarnessError::PoolTooSmall { accounts: 1 }));
    }

    #[test]
    fn two_account_pool_always_pairs_zero_and_one() {
        let plan = LoadPlan::random(3, 2, 50, 1).unwrap();

        for transfer in plan.transfers() {
            assert_eq!(
                coffer_core::lock_order(transfer.from, transfer.to),
                (0, 1)
            );
        }
    }
}
