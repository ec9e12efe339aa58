//! Investment records
//!
//! Only the per-user total of active investments matters to this core:
//! it feeds the informational voting-power breakdown, never the
//! canonical voting-power formula.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvestmentStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub status: InvestmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Investment {
    pub fn new(user_id: String, amount: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            amount,
            status: InvestmentStatus::Active,
            created_at: now,
        }
    }
}
