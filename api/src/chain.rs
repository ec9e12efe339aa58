//! Optional blockchain collaborator
//!
//! A chain client may countersign a committed vote; the signature is
//! stored for display only. Countersign failure never blocks or rolls
//! back the vote.

use perpetua_governance::Vote;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Chain client unavailable: {0}")]
    Unavailable(String),

    #[error("Countersigning disabled")]
    Disabled,
}

pub trait ChainClient: Send + Sync {
    /// Produce an on-chain transaction signature for a committed vote.
    fn countersign_vote(&self, vote: &Vote) -> Result<String, ChainError>;
}

/// Deterministic stand-in signer for dev and test networks.
pub struct DevChainClient;

impl ChainClient for DevChainClient {
    fn countersign_vote(&self, vote: &Vote) -> Result<String, ChainError> {
        let mut hasher = Sha256::new();
        hasher.update(vote.id.as_bytes());
        hasher.update(vote.proposal_id.as_bytes());
        hasher.update(vote.option_id.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Used when no chain endpoint is configured.
pub struct DisabledChainClient;

impl ChainClient for DisabledChainClient {
    fn countersign_vote(&self, _vote: &Vote) -> Result<String, ChainError> {
        Err(ChainError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_vote() -> Vote {
        Vote {
            id: "vote-1".to_string(),
            user_id: "alice".to_string(),
            proposal_id: "prop-1".to_string(),
            option_id: "opt-1".to_string(),
            voting_power: 50.0,
            cast_at: Utc::now(),
            chain_signature: None,
        }
    }

    #[test]
    fn test_dev_client_is_deterministic() {
        let client = DevChainClient;
        let vote = sample_vote();
        let a = client.countersign_vote(&vote).unwrap();
        let b = client.countersign_vote(&vote).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_disabled_client_errors() {
        assert!(DisabledChainClient.countersign_vote(&sample_vote()).is_err());
    }
}
