//! User accounts and token balances

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Member,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Free (spendable) balance. Mutated only by ledger operations.
    pub token_balance: f64,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, role: Role, token_balance: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            role,
            token_balance,
            wallet_address: None,
            created_at,
        }
    }

    /// Account age in whole days at `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }
}
