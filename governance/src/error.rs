//! Governance error types

use perpetua_ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Governance proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("Vote not found: {0}")]
    VoteNotFound(String),

    #[error("Voting period for proposal {0} has ended")]
    VotingClosed(String),

    #[error("Invalid voting option: {0}")]
    InvalidOption(String),

    #[error("User {user_id} has already voted on proposal {proposal_id}")]
    AlreadyVoted {
        user_id: String,
        proposal_id: String,
    },

    #[error("User has no voting power")]
    NoVotingPower,

    #[error("Insufficient voting power to create a proposal: have {actual}, minimum {required}")]
    InsufficientVotingPower { required: u64, actual: u64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
