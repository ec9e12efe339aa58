//! Governance handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use perpetua_governance::{
    power, NewProposal, Page, PowerBreakdown, Proposal, ProposalView, StatusFilter, Vote,
    VoteHistoryEntry,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{Identity, MaybeIdentity};
use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProposalRequest {
    #[validate(length(min = 5, max = 100, message = "Title must be 5-100 characters"))]
    pub title: String,
    #[validate(length(min = 20, message = "Description must be at least 20 characters"))]
    pub description: String,
    #[validate(length(min = 2, message = "At least 2 options are required"))]
    pub options: Vec<String>,
    pub end_date: DateTime<Utc>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ProposalsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct VotingPowerResponse {
    pub user_id: String,
    /// Floored canonical power, matching the create-proposal gate
    pub voting_power: u64,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Create a new governance proposal
pub async fn create_proposal(
    State(state): State<ApiState>,
    identity: Identity,
    Json(request): Json<CreateProposalRequest>,
) -> ApiResult<(StatusCode, Json<Proposal>)> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let now = Utc::now();
    let creator_power = {
        let book = state.ledger.read().await;
        power::calculate(&book, &identity.user_id, now)?
    };

    let proposal = {
        let mut registry = state.governance.write().await;
        registry.create_proposal(
            &identity.user_id,
            NewProposal {
                title: request.title,
                description: request.description,
                options: request.options,
                end_date: request.end_date,
                category: request.category,
                tags: request.tags,
            },
            creator_power,
            now,
        )?
    };
    state.persist().await;

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// List proposals with status/category filters and pagination
pub async fn list_proposals(
    State(state): State<ApiState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(query): Query<ProposalsQuery>,
) -> ApiResult<Json<Page<ProposalView>>> {
    let status = match query.status.as_deref() {
        Some(value) => StatusFilter::parse(value)?,
        None => StatusFilter::All,
    };
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10).min(100);
    let viewer = identity.as_ref().map(|i| i.user_id.as_str());

    let registry = state.governance.read().await;
    Ok(Json(registry.proposals_page(
        status,
        query.category.as_deref(),
        page,
        limit,
        viewer,
        Utc::now(),
    )))
}

/// Get one proposal with tallies, percentages and the viewer's vote
pub async fn get_proposal(
    State(state): State<ApiState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(proposal_id): Path<String>,
) -> ApiResult<Json<ProposalView>> {
    let viewer = identity.as_ref().map(|i| i.user_id.as_str());
    let registry = state.governance.read().await;
    Ok(Json(registry.proposal_view(&proposal_id, viewer, Utc::now())?))
}

/// Cast a vote on a proposal
pub async fn vote(
    State(state): State<ApiState>,
    identity: Identity,
    Path(proposal_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<Vote>> {
    let now = Utc::now();

    // power is read from the ledger; the vote itself commits under the
    // governance write guard
    let voting_power = {
        let book = state.ledger.read().await;
        power::calculate(&book, &identity.user_id, now)?
    };

    let mut vote = {
        let mut registry = state.governance.write().await;
        registry.cast_vote(
            &identity.user_id,
            &proposal_id,
            &request.option_id,
            voting_power,
            now,
        )?
    };

    // best-effort countersign after the vote has committed
    match state.chain.countersign_vote(&vote) {
        Ok(signature) => {
            let mut registry = state.governance.write().await;
            if registry
                .attach_chain_signature(&vote.id, signature.clone())
                .is_ok()
            {
                vote.chain_signature = Some(signature);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, vote_id = %vote.id, "on-chain countersign failed; vote stands");
        }
    }
    state.persist().await;

    Ok(Json(vote))
}

/// Get a user's canonical voting power (floored)
pub async fn get_voting_power(
    State(state): State<ApiState>,
    identity: Identity,
    Path(user_id): Path<String>,
) -> ApiResult<Json<VotingPowerResponse>> {
    identity.require_self_or_admin(&user_id)?;

    let book = state.ledger.read().await;
    let voting_power = power::calculate(&book, &user_id, Utc::now())?;
    Ok(Json(VotingPowerResponse {
        user_id,
        voting_power: voting_power.floor().max(0.0) as u64,
    }))
}

/// Get the informational voting-power breakdown
pub async fn get_voting_power_breakdown(
    State(state): State<ApiState>,
    identity: Identity,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PowerBreakdown>> {
    identity.require_self_or_admin(&user_id)?;

    let prior_votes = {
        let registry = state.governance.read().await;
        registry.vote_count_of(&user_id)
    };
    let book = state.ledger.read().await;
    let breakdown = PowerBreakdown::compute(&book, &user_id, prior_votes, Utc::now())?;
    Ok(Json(breakdown))
}

/// Get the caller's voting history
pub async fn get_voting_history(
    State(state): State<ApiState>,
    identity: Identity,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Page<VoteHistoryEntry>>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10).min(100);

    let registry = state.governance.read().await;
    Ok(Json(registry.voting_history(&identity.user_id, page, limit)))
}

/// Get distinct proposal categories
pub async fn get_categories(
    State(state): State<ApiState>,
) -> ApiResult<Json<CategoriesResponse>> {
    let registry = state.governance.read().await;
    Ok(Json(CategoriesResponse {
        categories: registry.categories(),
    }))
}
