//! Ledger error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Receiving delegation user not found: {0}")]
    RecipientNotFound(String),

    #[error("Delegation record not found: {0}")]
    DelegationNotFound(String),

    #[error("Insufficient token balance: have {available}, need {requested}")]
    InsufficientBalance { available: f64, requested: f64 },

    #[error("Cannot delegate voting power to yourself")]
    SelfDelegation,

    #[error("Not authorized to revoke delegation {0}")]
    Forbidden(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
