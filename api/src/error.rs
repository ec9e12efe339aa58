//! API error handling
//!
//! Every domain failure is an expected, caller-recoverable condition
//! mapped to a 4xx JSON body. Store failures surface as 503.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use perpetua_governance::GovernanceError;
use perpetua_ledger::LedgerError;
use perpetua_storage::StorageError;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::StoreUnavailable(err.to_string())
    }
}

fn ledger_parts(err: &LedgerError) -> (StatusCode, &'static str) {
    match err {
        LedgerError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
        LedgerError::RecipientNotFound(_) => (StatusCode::NOT_FOUND, "recipient_not_found"),
        LedgerError::DelegationNotFound(_) => (StatusCode::NOT_FOUND, "delegation_not_found"),
        LedgerError::InsufficientBalance { .. } => {
            (StatusCode::BAD_REQUEST, "insufficient_balance")
        }
        LedgerError::SelfDelegation => (StatusCode::BAD_REQUEST, "self_delegation"),
        LedgerError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        LedgerError::InvalidAmount(_) | LedgerError::InvalidDuration(_) => {
            (StatusCode::BAD_REQUEST, "validation_error")
        }
    }
}

fn governance_parts(err: &GovernanceError) -> (StatusCode, &'static str) {
    match err {
        GovernanceError::ProposalNotFound(_) => (StatusCode::NOT_FOUND, "proposal_not_found"),
        GovernanceError::VoteNotFound(_) => (StatusCode::NOT_FOUND, "vote_not_found"),
        GovernanceError::VotingClosed(_) => (StatusCode::BAD_REQUEST, "voting_closed"),
        GovernanceError::InvalidOption(_) => (StatusCode::BAD_REQUEST, "invalid_option"),
        GovernanceError::AlreadyVoted { .. } => (StatusCode::BAD_REQUEST, "already_voted"),
        GovernanceError::NoVotingPower => (StatusCode::BAD_REQUEST, "no_voting_power"),
        GovernanceError::InsufficientVotingPower { .. } => {
            (StatusCode::FORBIDDEN, "insufficient_voting_power")
        }
        GovernanceError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        GovernanceError::Ledger(inner) => ledger_parts(inner),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_type) = match &self {
            ApiError::Ledger(e) => ledger_parts(e),
            ApiError::Governance(e) => governance_parts(e),
            ApiError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        };

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_status_mapping() {
        let cases = [
            (
                ApiError::Ledger(LedgerError::UserNotFound("u".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Ledger(LedgerError::InsufficientBalance {
                    available: 1.0,
                    requested: 2.0,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Governance(GovernanceError::AlreadyVoted {
                    user_id: "u".into(),
                    proposal_id: "p".into(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Governance(GovernanceError::InsufficientVotingPower {
                    required: 100,
                    actual: 7,
                }),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
