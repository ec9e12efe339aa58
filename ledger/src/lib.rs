//! Perpetua Token Ledger
//!
//! Tracks spendable token balances, time-locked token records and
//! voting-power delegations between users. Every multi-step mutation
//! goes through [`LedgerBook`], which validates before it touches any
//! state so a failed call leaves the book unchanged.

pub mod account;
pub mod book;
pub mod delegation;
pub mod error;
pub mod investment;
pub mod lock;

pub use account::{Account, Role};
pub use book::LedgerBook;
pub use delegation::Delegation;
pub use error::{LedgerError, Result};
pub use investment::{Investment, InvestmentStatus};
pub use lock::{LockStatus, TokenLock};

/// Ledger configuration constants
pub mod config {
    /// Default delegation lifetime when no expiry is given (30 days)
    pub const DEFAULT_DELEGATION_DAYS: i64 = 30;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_constants() {
        assert_eq!(config::DEFAULT_DELEGATION_DAYS, 30);
    }
}
