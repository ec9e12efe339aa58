//! Route table

use crate::governance_handlers::{
    create_proposal, get_categories, get_proposal, get_voting_history, get_voting_power,
    get_voting_power_breakdown, list_proposals, vote,
};
use crate::token_handlers::{
    delegate, get_balance, get_locked_tokens, lock_tokens, revoke_delegation, unlock_expired,
};
use crate::{ApiResult, ApiState};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

pub fn create_routes() -> Router<ApiState> {
    Router::new()
        // Voting power
        .route("/voting-power/{user_id}", get(get_voting_power))
        .route(
            "/voting-power/{user_id}/breakdown",
            get(get_voting_power_breakdown),
        )
        // Token ledger
        .route("/token/balance/{user_id}", get(get_balance))
        .route("/token/locked/{user_id}", get(get_locked_tokens))
        .route("/token/lock", post(lock_tokens))
        .route("/token/delegate", post(delegate))
        .route("/token/revoke-delegation/{id}", post(revoke_delegation))
        .route("/token/unlock-expired/{user_id}", post(unlock_expired))
        // Governance
        .route(
            "/governance/proposals",
            get(list_proposals).post(create_proposal),
        )
        .route("/governance/proposals/{id}", get(get_proposal))
        .route("/governance/proposals/{id}/vote", post(vote))
        .route("/governance/categories", get(get_categories))
        .route("/governance/voting-history", get(get_voting_history))
        // Service
        .route("/", get(root))
        .route("/health", get(health_check))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    dev_mode: bool,
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "perpetua-governance",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        dev_mode: state.dev_mode,
    }))
}
