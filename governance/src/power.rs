//! Voting power calculation
//!
//! Two formulas live here and they are not equivalent:
//!
//! * [`calculate`] is the canonical weight a user contributes when
//!   voting: free balance, plus each active lock scaled by a time bonus
//!   that saturates at 365 remaining days, plus unexpired incoming
//!   delegations. The result is fractional; callers that need an
//!   integer (the create-proposal gate) floor it themselves.
//! * [`PowerBreakdown`] is a display-only decomposition built from
//!   investment totals, account age and voting activity. It never feeds
//!   a tally.

use chrono::{DateTime, Utc};
use perpetua_ledger::LedgerBook;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::Result;

/// Canonical voting power. Pure function of ledger state and `now`,
/// recomputed on every call.
pub fn calculate(book: &LedgerBook, user_id: &str, now: DateTime<Utc>) -> Result<f64> {
    let base = book.balance_of(user_id)?;

    let mut power = 0.0;
    for lock in book.locked_tokens(user_id, now) {
        let days_remaining = lock.days_remaining(now);
        let time_bonus =
            (days_remaining / config::LOCK_BONUS_HORIZON_DAYS).min(1.0) * config::MAX_LOCK_BONUS;
        power += lock.amount * (1.0 + time_bonus);
    }

    power += base;

    for delegation in book.delegations_to(user_id, now) {
        power += delegation.amount;
    }

    Ok(power)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerComponent {
    pub value: u64,
    pub details: String,
}

/// Informational voting-power breakdown for UI display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerBreakdown {
    pub total_voting_power: u64,
    pub investment_power: PowerComponent,
    pub account_age_power: PowerComponent,
    pub activity_power: PowerComponent,
}

impl PowerBreakdown {
    pub fn compute(
        book: &LedgerBook,
        user_id: &str,
        prior_votes: u64,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let account = book.account(user_id)?;
        let total_investment = book.active_investment_total(user_id);
        let age_days = account.age_days(now);

        let investment_power = (total_investment / config::INVESTMENT_POWER_DIVISOR).floor() as u64;
        let age_power =
            ((age_days / config::AGE_POWER_DIVISOR_DAYS) as u64).min(config::AGE_POWER_CAP);
        let activity_power =
            (prior_votes / config::ACTIVITY_POWER_DIVISOR).min(config::ACTIVITY_POWER_CAP);

        Ok(Self {
            total_voting_power: investment_power + age_power + activity_power,
            investment_power: PowerComponent {
                value: investment_power,
                details: format!("Based on ${:.2} total investment", total_investment),
            },
            account_age_power: PowerComponent {
                value: age_power,
                details: format!("Based on {} days account age", age_days),
            },
            activity_power: PowerComponent {
                value: activity_power,
                details: format!("Based on {} previous votes", prior_votes),
            },
        })
    }
}
