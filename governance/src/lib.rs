//! Perpetua Governance Module
//!
//! Implements the voting-power calculation and the proposal voting
//! state machine on top of the token ledger: users spend their weight
//! (balance + time-locked bonus + incoming delegations) on exactly one
//! option per proposal, and option tallies accumulate that weight.

pub mod error;
pub mod power;
pub mod proposal;
pub mod voting;

pub use error::{GovernanceError, Result};
pub use power::{PowerBreakdown, PowerComponent};
pub use proposal::{NewProposal, OptionView, Proposal, ProposalOption, ProposalView, UserVote};
pub use voting::{GovernanceRegistry, Page, PageMeta, StatusFilter, Vote, VoteHistoryEntry};

/// Governance configuration constants
pub mod config {
    /// Minimum (floored) voting power required to create a proposal
    pub const MIN_PROPOSAL_POWER: u64 = 100;

    /// A proposal's end date must be at least this far in the future
    pub const MIN_VOTING_HORIZON_HOURS: i64 = 24;

    /// Minimum number of options per proposal
    pub const MIN_OPTIONS: usize = 2;

    /// Title length bounds (characters)
    pub const TITLE_MIN_CHARS: usize = 5;
    pub const TITLE_MAX_CHARS: usize = 100;

    /// Minimum description length (characters)
    pub const DESCRIPTION_MIN_CHARS: usize = 20;

    /// Lock time bonus saturates at this many remaining days
    pub const LOCK_BONUS_HORIZON_DAYS: f64 = 365.0;

    /// Maximum locked-token bonus (36.5%)
    pub const MAX_LOCK_BONUS: f64 = 0.365;

    /// Breakdown heuristic: 1 point per this much active investment
    pub const INVESTMENT_POWER_DIVISOR: f64 = 100.0;

    /// Breakdown heuristic: 1 point per 30 days of account age, capped
    pub const AGE_POWER_DIVISOR_DAYS: i64 = 30;
    pub const AGE_POWER_CAP: u64 = 10;

    /// Breakdown heuristic: 1 point per 5 prior votes, capped
    pub const ACTIVITY_POWER_DIVISOR: u64 = 5;
    pub const ACTIVITY_POWER_CAP: u64 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governance_constants() {
        assert_eq!(config::MIN_PROPOSAL_POWER, 100);
        assert_eq!(config::MIN_VOTING_HORIZON_HOURS, 24);
        assert_eq!(config::MAX_LOCK_BONUS, 0.365);
    }
}
