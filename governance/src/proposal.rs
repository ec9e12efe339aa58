//! Proposal types and views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One selectable option. `vote_count` is a weight accumulator (sum of
/// the voting power spent on this option), not a raw ballot count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalOption {
    pub id: String,
    pub text: String,
    pub vote_count: f64,
}

impl ProposalOption {
    pub fn new(text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            vote_count: 0.0,
        }
    }
}

/// Parameters for creating a new proposal
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub end_date: DateTime<Utc>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub options: Vec<ProposalOption>,
}

impl Proposal {
    pub fn new(creator_id: String, params: NewProposal, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: params.title,
            description: params.description,
            category: params.category,
            tags: params.tags,
            creator_id,
            created_at: now,
            end_date: params.end_date,
            options: params.options.into_iter().map(ProposalOption::new).collect(),
        }
    }

    /// Derived, never stored: a proposal accepts votes until its end
    /// date.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.end_date
    }

    pub fn option(&self, option_id: &str) -> Option<&ProposalOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// The viewer's own vote on a proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserVote {
    pub option_id: String,
    pub voting_power: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionView {
    pub id: String,
    pub text: String,
    pub vote_count: f64,
    /// Share of the total tally, 0 when nobody has voted yet
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub options: Vec<OptionView>,
    pub total_votes: f64,
    pub is_active: bool,
    pub user_vote: Option<UserVote>,
}

impl ProposalView {
    pub fn build(proposal: &Proposal, user_vote: Option<UserVote>, now: DateTime<Utc>) -> Self {
        let total_votes: f64 = proposal.options.iter().map(|o| o.vote_count).sum();
        let options = proposal
            .options
            .iter()
            .map(|o| OptionView {
                id: o.id.clone(),
                text: o.text.clone(),
                vote_count: o.vote_count,
                percentage: if total_votes > 0.0 {
                    o.vote_count / total_votes * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            id: proposal.id.clone(),
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            category: proposal.category.clone(),
            tags: proposal.tags.clone(),
            creator_id: proposal.creator_id.clone(),
            created_at: proposal.created_at,
            end_date: proposal.end_date,
            options,
            total_votes,
            is_active: proposal.is_active(now),
            user_vote,
        }
    }
}
