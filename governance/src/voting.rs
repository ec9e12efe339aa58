//! Voting state machine and proposal registry
//!
//! [`GovernanceRegistry`] owns all proposals and votes. Per (user,
//! proposal) pair the state is NotVoted -> Voted, terminal: there is no
//! retraction. Every mutating operation validates against the current
//! state before writing anything, and callers hold a single write guard
//! for the whole call, so the duplicate-vote check, the vote insert and
//! the tally increment always see one consistent snapshot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;

use crate::config;
use crate::error::{GovernanceError, Result};
use crate::proposal::{NewProposal, Proposal, ProposalView, UserVote};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub user_id: String,
    pub proposal_id: String,
    pub option_id: String,
    /// Power snapshotted at cast time; never recomputed later
    pub voting_power: f64,
    pub cast_at: DateTime<Utc>,
    /// On-chain countersignature, attached after the vote is committed.
    /// Display only; no invariant depends on it.
    pub chain_signature: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Completed,
    All,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "all" => Ok(Self::All),
            other => Err(GovernanceError::Validation(format!(
                "Status must be active, completed or all, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(limit);
    // saturate so an absurd page number yields an empty page, not a panic
    let skip = page.saturating_sub(1).saturating_mul(limit);
    let data = items.into_iter().skip(skip).take(limit).collect();
    Page {
        data,
        meta: PageMeta {
            total,
            page,
            limit,
            total_pages,
        },
    }
}

/// One entry of a user's voting history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteHistoryEntry {
    pub vote_id: String,
    pub proposal_id: String,
    pub proposal_title: String,
    pub proposal_end_date: DateTime<Utc>,
    pub option_id: String,
    pub option_text: String,
    pub voting_power: f64,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceRegistry {
    proposals: HashMap<String, Proposal>,
    votes: Vec<Vote>,
}

impl GovernanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a proposal with its options. `creator_power` is the
    /// creator's canonical voting power; the gate floors it.
    pub fn create_proposal(
        &mut self,
        creator_id: &str,
        params: NewProposal,
        creator_power: f64,
        now: DateTime<Utc>,
    ) -> Result<Proposal> {
        let floored = creator_power.floor().max(0.0) as u64;
        if floored < config::MIN_PROPOSAL_POWER {
            return Err(GovernanceError::InsufficientVotingPower {
                required: config::MIN_PROPOSAL_POWER,
                actual: floored,
            });
        }

        validate_proposal_input(&params, now)?;

        let proposal = Proposal::new(creator_id.to_string(), params, now);
        tracing::info!(
            proposal_id = %proposal.id,
            creator_id,
            "governance proposal created"
        );
        self.proposals.insert(proposal.id.clone(), proposal.clone());
        Ok(proposal)
    }

    /// Cast a vote. All checks and both writes (vote insert, tally
    /// increment) happen under the caller's single write guard; on any
    /// error nothing has been written.
    pub fn cast_vote(
        &mut self,
        user_id: &str,
        proposal_id: &str,
        option_id: &str,
        power: f64,
        now: DateTime<Utc>,
    ) -> Result<Vote> {
        let proposal = self
            .proposals
            .get(proposal_id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(proposal_id.to_string()))?;

        if now >= proposal.end_date {
            return Err(GovernanceError::VotingClosed(proposal_id.to_string()));
        }
        if proposal.option(option_id).is_none() {
            return Err(GovernanceError::InvalidOption(option_id.to_string()));
        }
        if self
            .votes
            .iter()
            .any(|v| v.user_id == user_id && v.proposal_id == proposal_id)
        {
            return Err(GovernanceError::AlreadyVoted {
                user_id: user_id.to_string(),
                proposal_id: proposal_id.to_string(),
            });
        }
        if power <= 0.0 {
            return Err(GovernanceError::NoVotingPower);
        }

        let vote = Vote {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            proposal_id: proposal_id.to_string(),
            option_id: option_id.to_string(),
            voting_power: power,
            cast_at: now,
            chain_signature: None,
        };
        self.votes.push(vote.clone());

        // relative increment, never a write-back of a stale read
        if let Some(option) = self
            .proposals
            .get_mut(proposal_id)
            .and_then(|p| p.options.iter_mut().find(|o| o.id == option_id))
        {
            option.vote_count += power;
        }

        tracing::info!(
            user_id,
            proposal_id,
            option_id,
            voting_power = power,
            "vote cast"
        );
        Ok(vote)
    }

    /// Attach an on-chain countersignature to a committed vote.
    pub fn attach_chain_signature(&mut self, vote_id: &str, signature: String) -> Result<()> {
        let vote = self
            .votes
            .iter_mut()
            .find(|v| v.id == vote_id)
            .ok_or_else(|| GovernanceError::VoteNotFound(vote_id.to_string()))?;
        vote.chain_signature = Some(signature);
        Ok(())
    }

    pub fn vote_of(&self, user_id: &str, proposal_id: &str) -> Option<&Vote> {
        self.votes
            .iter()
            .find(|v| v.user_id == user_id && v.proposal_id == proposal_id)
    }

    /// Number of votes the user has cast across all proposals.
    pub fn vote_count_of(&self, user_id: &str) -> u64 {
        self.votes.iter().filter(|v| v.user_id == user_id).count() as u64
    }

    pub fn proposal(&self, proposal_id: &str) -> Result<&Proposal> {
        self.proposals
            .get(proposal_id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(proposal_id.to_string()))
    }

    /// Single proposal with option percentages, derived active flag and
    /// the viewer's own vote.
    pub fn proposal_view(
        &self,
        proposal_id: &str,
        viewer_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProposalView> {
        let proposal = self.proposal(proposal_id)?;
        Ok(ProposalView::build(proposal, self.viewer_vote(viewer_id, proposal_id), now))
    }

    /// Paginated proposal list, newest first.
    pub fn proposals_page(
        &self,
        status: StatusFilter,
        category: Option<&str>,
        page: usize,
        limit: usize,
        viewer_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Page<ProposalView> {
        let mut matching: Vec<&Proposal> = self
            .proposals
            .values()
            .filter(|p| match status {
                StatusFilter::Active => p.end_date > now,
                StatusFilter::Completed => p.end_date <= now,
                StatusFilter::All => true,
            })
            .filter(|p| match category {
                Some(c) => p.category.as_deref() == Some(c),
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let views = matching
            .into_iter()
            .map(|p| ProposalView::build(p, self.viewer_vote(viewer_id, &p.id), now))
            .collect();
        paginate(views, page, limit)
    }

    /// Distinct non-null categories.
    pub fn categories(&self) -> Vec<String> {
        let set: HashSet<&String> = self
            .proposals
            .values()
            .filter_map(|p| p.category.as_ref())
            .collect();
        let mut categories: Vec<String> = set.into_iter().cloned().collect();
        categories.sort();
        categories
    }

    /// The user's votes joined with proposal and option details, newest
    /// first.
    pub fn voting_history(
        &self,
        user_id: &str,
        page: usize,
        limit: usize,
    ) -> Page<VoteHistoryEntry> {
        let mut votes: Vec<&Vote> = self
            .votes
            .iter()
            .filter(|v| v.user_id == user_id)
            .collect();
        votes.sort_by(|a, b| b.cast_at.cmp(&a.cast_at));

        let entries = votes
            .into_iter()
            .filter_map(|v| {
                let proposal = self.proposals.get(&v.proposal_id)?;
                let option = proposal.option(&v.option_id)?;
                Some(VoteHistoryEntry {
                    vote_id: v.id.clone(),
                    proposal_id: proposal.id.clone(),
                    proposal_title: proposal.title.clone(),
                    proposal_end_date: proposal.end_date,
                    option_id: option.id.clone(),
                    option_text: option.text.clone(),
                    voting_power: v.voting_power,
                    cast_at: v.cast_at,
                })
            })
            .collect();
        paginate(entries, page, limit)
    }

    /// Votes cast on one proposal.
    pub fn votes_for<'a>(&'a self, proposal_id: &'a str) -> impl Iterator<Item = &'a Vote> + 'a {
        self.votes
            .iter()
            .filter(move |v| v.proposal_id == proposal_id)
    }

    fn viewer_vote(&self, viewer_id: Option<&str>, proposal_id: &str) -> Option<UserVote> {
        let viewer = viewer_id?;
        self.vote_of(viewer, proposal_id).map(|v| UserVote {
            option_id: v.option_id.clone(),
            voting_power: v.voting_power,
        })
    }
}

fn validate_proposal_input(params: &NewProposal, now: DateTime<Utc>) -> Result<()> {
    let title_len = params.title.trim().chars().count();
    if title_len < config::TITLE_MIN_CHARS || title_len > config::TITLE_MAX_CHARS {
        return Err(GovernanceError::Validation(format!(
            "Title must be between {} and {} characters",
            config::TITLE_MIN_CHARS,
            config::TITLE_MAX_CHARS
        )));
    }
    if params.description.trim().chars().count() < config::DESCRIPTION_MIN_CHARS {
        return Err(GovernanceError::Validation(format!(
            "Description must be at least {} characters",
            config::DESCRIPTION_MIN_CHARS
        )));
    }
    if params.options.len() < config::MIN_OPTIONS {
        return Err(GovernanceError::Validation(format!(
            "At least {} options are required",
            config::MIN_OPTIONS
        )));
    }
    if params.options.iter().any(|o| o.trim().is_empty()) {
        return Err(GovernanceError::Validation(
            "Options must be non-empty strings".to_string(),
        ));
    }
    // case-sensitive uniqueness
    let unique: HashSet<&String> = params.options.iter().collect();
    if unique.len() != params.options.len() {
        return Err(GovernanceError::Validation(
            "Options must be unique".to_string(),
        ));
    }
    if params.end_date < now + Duration::hours(config::MIN_VOTING_HORIZON_HOURS) {
        return Err(GovernanceError::Validation(format!(
            "End date must be at least {} hours in the future",
            config::MIN_VOTING_HORIZON_HOURS
        )));
    }
    Ok(())
}
