//! Token ledger handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use perpetua_ledger::{Delegation, TokenLock};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

#[derive(Debug, Serialize)]
pub struct LockedTokensResponse {
    pub locked_tokens: Vec<TokenLock>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LockRequest {
    pub user_id: String,
    #[validate(range(min = 0.01, message = "Lock amount must be at least 0.01"))]
    pub amount: f64,
    #[validate(range(min = 1, message = "Lock duration must be at least 1 day"))]
    pub duration_days: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DelegateRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    #[validate(range(min = 0.01, message = "Delegate amount must be at least 0.01"))]
    pub amount: f64,
    #[validate(range(min = 1, message = "Delegation duration must be at least 1 day"))]
    pub duration_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub unlocked: f64,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub restored: f64,
}

/// Get a user's free token balance
pub async fn get_balance(
    State(state): State<ApiState>,
    identity: Identity,
    Path(user_id): Path<String>,
) -> ApiResult<Json<BalanceResponse>> {
    identity.require_self_or_admin(&user_id)?;

    let book = state.ledger.read().await;
    let balance = book.balance_of(&user_id)?;
    Ok(Json(BalanceResponse { balance }))
}

/// Get a user's active token locks
pub async fn get_locked_tokens(
    State(state): State<ApiState>,
    identity: Identity,
    Path(user_id): Path<String>,
) -> ApiResult<Json<LockedTokensResponse>> {
    identity.require_self_or_admin(&user_id)?;

    let book = state.ledger.read().await;
    book.account(&user_id)?;
    let locked_tokens = book
        .locked_tokens(&user_id, Utc::now())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(LockedTokensResponse { locked_tokens }))
}

/// Lock tokens to increase voting power
pub async fn lock_tokens(
    State(state): State<ApiState>,
    identity: Identity,
    Json(request): Json<LockRequest>,
) -> ApiResult<(StatusCode, Json<TokenLock>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    identity.require_self_or_admin(&request.user_id)?;

    let lock = {
        let mut book = state.ledger.write().await;
        book.lock_tokens(
            &request.user_id,
            request.amount,
            request.duration_days,
            Utc::now(),
        )?
    };
    state.persist().await;

    Ok((StatusCode::CREATED, Json(lock)))
}

/// Delegate voting power to another user
pub async fn delegate(
    State(state): State<ApiState>,
    identity: Identity,
    Json(request): Json<DelegateRequest>,
) -> ApiResult<(StatusCode, Json<Delegation>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    identity.require_self_or_admin(&request.from_user_id)?;

    let now = Utc::now();
    let expiry: Option<DateTime<Utc>> = request
        .duration_days
        .map(|days| now + Duration::days(days as i64));

    let delegation = {
        let mut book = state.ledger.write().await;
        book.delegate(
            &request.from_user_id,
            &request.to_user_id,
            request.amount,
            expiry,
            now,
        )?
    };
    state.persist().await;

    Ok((StatusCode::CREATED, Json(delegation)))
}

/// Revoke a delegation, restoring its amount to the delegator
pub async fn revoke_delegation(
    State(state): State<ApiState>,
    identity: Identity,
    Path(delegation_id): Path<String>,
) -> ApiResult<Json<RevokeResponse>> {
    let restored = {
        let mut book = state.ledger.write().await;
        book.revoke_delegation(&delegation_id, &identity.user_id)?
    };
    state.persist().await;

    Ok(Json(RevokeResponse { restored }))
}

/// Sweep the user's expired locks back into the free balance
pub async fn unlock_expired(
    State(state): State<ApiState>,
    identity: Identity,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UnlockResponse>> {
    identity.require_self_or_admin(&user_id)?;

    let unlocked = {
        let mut book = state.ledger.write().await;
        book.unlock_expired(&user_id, Utc::now())?
    };
    if unlocked > 0.0 {
        state.persist().await;
    }

    Ok(Json(UnlockResponse { unlocked }))
}
