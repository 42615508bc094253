//! Transfer error types.

/// Structural errors surfaced synchronously by a transfer operation.
///
/// Both variants are caller bugs rather than runtime conditions: positions
/// originate from trusted internal callers, so an out-of-range position or
/// a self-transfer means the request was malformed. They are rejected
/// before any lock is taken.
///
/// Deadlock is deliberately absent from this enum. A circular wait in the
/// unsafe variant is an emergent liveness failure: the blocked tasks never
/// return, so there is no error value to produce. Only an external observer
/// (the harness) can report it, via a bounded observation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// A position was outside the bank's account range.
    #[error("position {position} out of range for bank of {accounts} accounts")]
    PositionOutOfRange {
        /// The offending position.
        position: usize,
        /// Number of accounts in the bank.
        accounts: usize,
    },

    /// Source and destination were the same position.
    ///
    /// Acquiring one mutex twice from the same task would deadlock (the
    /// locks here are not re-entrant), so self-transfers are rejected
    /// before any locking occurs.
    #[error("self-transfer at position {position} is rejected")]
    SelfTransfer {
        /// The position named as both source and destination.
        position: usize,
    },
}
