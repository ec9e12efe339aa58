//! Voting-power delegations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directed delegation edge. Creating one deducts `amount` from the
/// delegator's free balance; revoking restores it. Only unexpired
/// delegations count toward the recipient's voting power.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: f64,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Delegation {
    pub fn new(
        from_user_id: String,
        to_user_id: String,
        amount: f64,
        expiry_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from_user_id,
            to_user_id,
            amount,
            expiry_date,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date <= now
    }
}
