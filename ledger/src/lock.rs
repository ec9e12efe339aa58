//! Token lock records
//!
//! A lock removes tokens from the free balance until its unlock date in
//! exchange for a voting-power time bonus. Locks are created by
//! [`crate::LedgerBook::lock_tokens`] and only ever transition
//! `Locked -> Unlocked` through the unlock sweep.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LockStatus {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLock {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub lock_date: DateTime<Utc>,
    pub unlock_date: DateTime<Utc>,
    pub status: LockStatus,
}

impl TokenLock {
    pub fn new(user_id: String, amount: f64, duration_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            amount,
            lock_date: now,
            unlock_date: now + Duration::days(duration_days as i64),
            status: LockStatus::Locked,
        }
    }

    /// Still locked and not yet past its unlock date.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == LockStatus::Locked && self.unlock_date > now
    }

    /// Fractional days until the unlock date, clamped at zero.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> f64 {
        let secs = (self.unlock_date - now).num_seconds();
        (secs as f64 / 86_400.0).max(0.0)
    }
}
