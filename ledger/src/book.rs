//! In-memory ledger book
//!
//! All balance-affecting operations run through `&mut self` and follow
//! validate-then-mutate: every check happens before the first write, so
//! a failed call has no effect. Callers that share a book across tasks
//! wrap it in a lock and hold the write guard for the whole call, which
//! is what makes each operation atomic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::{Account, Role};
use crate::config;
use crate::delegation::Delegation;
use crate::error::{LedgerError, Result};
use crate::investment::{Investment, InvestmentStatus};
use crate::lock::{LockStatus, TokenLock};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerBook {
    accounts: HashMap<String, Account>,
    locks: HashMap<String, TokenLock>,
    delegations: HashMap<String, Delegation>,
    investments: Vec<Investment>,
}

impl LedgerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account with an initial free balance.
    pub fn create_account(
        &mut self,
        name: &str,
        role: Role,
        initial_balance: f64,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        if initial_balance < 0.0 {
            return Err(LedgerError::InvalidAmount(
                "Initial balance must not be negative".to_string(),
            ));
        }
        let account = Account::new(name.to_string(), role, initial_balance, now);
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    pub fn account(&self, user_id: &str) -> Result<&Account> {
        self.accounts
            .get(user_id)
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }

    /// Current free balance.
    pub fn balance_of(&self, user_id: &str) -> Result<f64> {
        Ok(self.account(user_id)?.token_balance)
    }

    /// The user's locks that are still locked and not yet past their
    /// unlock date.
    pub fn locked_tokens(&self, user_id: &str, now: DateTime<Utc>) -> Vec<&TokenLock> {
        self.locks
            .values()
            .filter(|l| l.user_id == user_id && l.is_active(now))
            .collect()
    }

    /// Lock `amount` tokens for `duration_days`, deducting them from the
    /// free balance.
    pub fn lock_tokens(
        &mut self,
        user_id: &str,
        amount: f64,
        duration_days: u32,
        now: DateTime<Utc>,
    ) -> Result<TokenLock> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(
                "Lock amount must be greater than 0".to_string(),
            ));
        }
        if duration_days == 0 {
            return Err(LedgerError::InvalidDuration(
                "Lock duration must be greater than 0 days".to_string(),
            ));
        }

        let balance = self.balance_of(user_id)?;
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }

        let lock = TokenLock::new(user_id.to_string(), amount, duration_days, now);
        self.locks.insert(lock.id.clone(), lock.clone());
        // account existence was checked by balance_of above
        if let Some(account) = self.accounts.get_mut(user_id) {
            account.token_balance -= amount;
        }
        Ok(lock)
    }

    /// Flip all of the user's expired locks to `Unlocked` and restore
    /// their summed amount to the free balance. Returns the total
    /// unlocked; 0 with no side effect when nothing is due, so repeated
    /// calls are idempotent.
    pub fn unlock_expired(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<f64> {
        self.account(user_id)?;

        let expired: Vec<String> = self
            .locks
            .values()
            .filter(|l| {
                l.user_id == user_id && l.status == LockStatus::Locked && l.unlock_date <= now
            })
            .map(|l| l.id.clone())
            .collect();

        if expired.is_empty() {
            return Ok(0.0);
        }

        let mut total = 0.0;
        for id in &expired {
            if let Some(lock) = self.locks.get_mut(id) {
                lock.status = LockStatus::Unlocked;
                total += lock.amount;
            }
        }
        if let Some(account) = self.accounts.get_mut(user_id) {
            account.token_balance += total;
        }
        Ok(total)
    }

    /// Delegate voting power to another user. The amount is deducted
    /// from the delegator's free balance until the delegation is
    /// revoked. Default expiry is 30 days out.
    pub fn delegate(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
        amount: f64,
        expiry_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Delegation> {
        if from_user_id == to_user_id {
            return Err(LedgerError::SelfDelegation);
        }
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(
                "Delegate amount must be greater than 0".to_string(),
            ));
        }

        let balance = self.balance_of(from_user_id)?;
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }
        if !self.accounts.contains_key(to_user_id) {
            return Err(LedgerError::RecipientNotFound(to_user_id.to_string()));
        }

        let expiry =
            expiry_date.unwrap_or(now + Duration::days(config::DEFAULT_DELEGATION_DAYS));
        let delegation = Delegation::new(
            from_user_id.to_string(),
            to_user_id.to_string(),
            amount,
            expiry,
            now,
        );
        self.delegations
            .insert(delegation.id.clone(), delegation.clone());
        if let Some(account) = self.accounts.get_mut(from_user_id) {
            account.token_balance -= amount;
        }
        Ok(delegation)
    }

    /// Delete a delegation and restore its amount to the delegator.
    /// Only the delegating user may revoke. Returns the restored amount.
    pub fn revoke_delegation(&mut self, delegation_id: &str, requester_id: &str) -> Result<f64> {
        let delegation = self
            .delegations
            .get(delegation_id)
            .ok_or_else(|| LedgerError::DelegationNotFound(delegation_id.to_string()))?;

        if delegation.from_user_id != requester_id {
            return Err(LedgerError::Forbidden(delegation_id.to_string()));
        }

        let amount = delegation.amount;
        let from_user_id = delegation.from_user_id.clone();
        self.delegations.remove(delegation_id);
        if let Some(account) = self.accounts.get_mut(&from_user_id) {
            account.token_balance += amount;
        }
        Ok(amount)
    }

    /// Unexpired delegations where the user is the recipient.
    pub fn delegations_to(&self, user_id: &str, now: DateTime<Utc>) -> Vec<&Delegation> {
        self.delegations
            .values()
            .filter(|d| d.to_user_id == user_id && !d.is_expired(now))
            .collect()
    }

    /// All delegations made by the user, expired or not.
    pub fn delegations_from(&self, user_id: &str) -> Vec<&Delegation> {
        self.delegations
            .values()
            .filter(|d| d.from_user_id == user_id)
            .collect()
    }

    pub fn record_investment(
        &mut self,
        user_id: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<Investment> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(
                "Investment amount must be greater than 0".to_string(),
            ));
        }
        self.account(user_id)?;
        let investment = Investment::new(user_id.to_string(), amount, now);
        self.investments.push(investment.clone());
        Ok(investment)
    }

    /// Sum of the user's active investment amounts.
    pub fn active_investment_total(&self, user_id: &str) -> f64 {
        self.investments
            .iter()
            .filter(|i| i.user_id == user_id && i.status == InvestmentStatus::Active)
            .map(|i| i.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_user(balance: f64, now: DateTime<Utc>) -> (LedgerBook, String) {
        let mut book = LedgerBook::new();
        let account = book
            .create_account("alice", Role::Member, balance, now)
            .unwrap();
        (book, account.id)
    }

    /// free balance + active locks + outstanding delegations
    fn conserved_total(book: &LedgerBook, user_id: &str, now: DateTime<Utc>) -> f64 {
        let free = book.balance_of(user_id).unwrap();
        let locked: f64 = book
            .locked_tokens(user_id, now)
            .iter()
            .map(|l| l.amount)
            .sum();
        let delegated: f64 = book
            .delegations_from(user_id)
            .iter()
            .map(|d| d.amount)
            .sum();
        free + locked + delegated
    }

    #[test]
    fn test_lock_deducts_balance() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(1000.0, now);

        let lock = book.lock_tokens(&alice, 400.0, 30, now).unwrap();
        assert_eq!(lock.status, LockStatus::Locked);
        assert_eq!(book.balance_of(&alice).unwrap(), 600.0);
        assert_eq!(book.locked_tokens(&alice, now).len(), 1);
    }

    #[test]
    fn test_lock_rejects_bad_input() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(100.0, now);

        assert!(matches!(
            book.lock_tokens(&alice, 0.0, 30, now),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            book.lock_tokens(&alice, 50.0, 0, now),
            Err(LedgerError::InvalidDuration(_))
        ));
        assert!(matches!(
            book.lock_tokens(&alice, 500.0, 30, now),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert!(matches!(
            book.lock_tokens("nobody", 50.0, 30, now),
            Err(LedgerError::UserNotFound(_))
        ));

        // failed calls left the balance alone
        assert_eq!(book.balance_of(&alice).unwrap(), 100.0);
    }

    #[test]
    fn test_unlock_expired_is_idempotent() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(1000.0, now);

        book.lock_tokens(&alice, 300.0, 10, now).unwrap();
        book.lock_tokens(&alice, 200.0, 40, now).unwrap();
        assert_eq!(book.balance_of(&alice).unwrap(), 500.0);

        let later = now + Duration::days(11);
        assert_eq!(book.unlock_expired(&alice, later).unwrap(), 300.0);
        assert_eq!(book.balance_of(&alice).unwrap(), 800.0);

        // second sweep finds nothing
        assert_eq!(book.unlock_expired(&alice, later).unwrap(), 0.0);
        assert_eq!(book.balance_of(&alice).unwrap(), 800.0);
    }

    #[test]
    fn test_delegate_and_revoke() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(1000.0, now);
        let bob = book
            .create_account("bob", Role::Member, 0.0, now)
            .unwrap()
            .id;

        let delegation = book.delegate(&alice, &bob, 250.0, None, now).unwrap();
        assert_eq!(book.balance_of(&alice).unwrap(), 750.0);
        // recipient's spendable balance is untouched
        assert_eq!(book.balance_of(&bob).unwrap(), 0.0);
        assert_eq!(delegation.expiry_date, now + Duration::days(30));
        assert_eq!(book.delegations_to(&bob, now).len(), 1);

        // bob cannot revoke alice's delegation
        assert!(matches!(
            book.revoke_delegation(&delegation.id, &bob),
            Err(LedgerError::Forbidden(_))
        ));

        let restored = book.revoke_delegation(&delegation.id, &alice).unwrap();
        assert_eq!(restored, 250.0);
        assert_eq!(book.balance_of(&alice).unwrap(), 1000.0);
        assert!(book.delegations_to(&bob, now).is_empty());
    }

    #[test]
    fn test_delegate_rejections() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(100.0, now);

        assert!(matches!(
            book.delegate(&alice, &alice, 50.0, None, now),
            Err(LedgerError::SelfDelegation)
        ));
        assert!(matches!(
            book.delegate(&alice, "nobody", 50.0, None, now),
            Err(LedgerError::RecipientNotFound(_))
        ));

        let bob = book
            .create_account("bob", Role::Member, 0.0, now)
            .unwrap()
            .id;
        assert!(matches!(
            book.delegate(&alice, &bob, 500.0, None, now),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(book.balance_of(&alice).unwrap(), 100.0);
    }

    #[test]
    fn test_expired_delegation_does_not_count_for_recipient() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(500.0, now);
        let bob = book
            .create_account("bob", Role::Member, 0.0, now)
            .unwrap()
            .id;

        book.delegate(&alice, &bob, 100.0, Some(now + Duration::days(5)), now)
            .unwrap();
        assert_eq!(book.delegations_to(&bob, now).len(), 1);
        assert!(book
            .delegations_to(&bob, now + Duration::days(6))
            .is_empty());
    }

    #[test]
    fn test_balance_conservation() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(1000.0, now);
        let bob = book
            .create_account("bob", Role::Member, 0.0, now)
            .unwrap()
            .id;

        assert_eq!(conserved_total(&book, &alice, now), 1000.0);

        book.lock_tokens(&alice, 300.0, 20, now).unwrap();
        assert_eq!(conserved_total(&book, &alice, now), 1000.0);

        let d = book.delegate(&alice, &bob, 200.0, None, now).unwrap();
        assert_eq!(conserved_total(&book, &alice, now), 1000.0);

        book.revoke_delegation(&d.id, &alice).unwrap();
        assert_eq!(conserved_total(&book, &alice, now), 1000.0);

        let later = now + Duration::days(21);
        book.unlock_expired(&alice, later).unwrap();
        assert_eq!(conserved_total(&book, &alice, later), 1000.0);
        assert_eq!(book.balance_of(&alice).unwrap(), 1000.0);
    }

    #[test]
    fn test_investment_total_counts_only_active() {
        let now = Utc::now();
        let (mut book, alice) = book_with_user(0.0, now);

        book.record_investment(&alice, 1200.0, now).unwrap();
        let second = book.record_investment(&alice, 300.0, now).unwrap();
        assert_eq!(book.active_investment_total(&alice), 1500.0);

        // deactivate one record
        book.investments
            .iter_mut()
            .find(|i| i.id == second.id)
            .unwrap()
            .status = InvestmentStatus::Inactive;
        assert_eq!(book.active_investment_total(&alice), 1200.0);
    }
}
