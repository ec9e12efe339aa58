//! Perpetua Storage Layer - Snapshot Persistence
//!
//! State lives in memory; the ledger book and governance registry are
//! written out as whole snapshots after mutations and at shutdown, and
//! loaded once on startup. Values are bincode-encoded in a sled
//! keyspace with an explicit flush for durability.

use perpetua_governance::GovernanceRegistry;
use perpetua_ledger::LedgerBook;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

const LEDGER_KEY: &[u8] = b"snapshot:ledger";
const GOVERNANCE_KEY: &[u8] = b"snapshot:governance";

#[derive(Debug, Clone)]
pub struct PlatformDb {
    db: sled::Db,
}

impl PlatformDb {
    /// Open or create the database directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| StorageError::Unavailable(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }

    pub fn save_ledger(&self, book: &LedgerBook) -> Result<()> {
        self.put(LEDGER_KEY, book)
    }

    pub fn load_ledger(&self) -> Result<Option<LedgerBook>> {
        self.get(LEDGER_KEY)
    }

    pub fn save_governance(&self, registry: &GovernanceRegistry) -> Result<()> {
        self.put(GOVERNANCE_KEY, registry)
    }

    pub fn load_governance(&self) -> Result<Option<GovernanceRegistry>> {
        self.get(GOVERNANCE_KEY)
    }

    /// Write both snapshots and flush once.
    pub fn save_all(&self, book: &LedgerBook, registry: &GovernanceRegistry) -> Result<()> {
        self.insert(LEDGER_KEY, book)?;
        self.insert(GOVERNANCE_KEY, registry)?;
        self.flush()
    }

    fn put<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        self.insert(key, value)?;
        self.flush()
    }

    fn insert<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let encoded = bincode::serialize(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.db
            .insert(key, encoded)
            .map_err(|e| StorageError::Unavailable(format!("Failed to write snapshot: {}", e)))?;
        Ok(())
    }

    // flush so a committed mutation survives a crash
    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| StorageError::Unavailable(format!("Failed to flush snapshot: {}", e)))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.db.get(key) {
            Ok(Some(data)) => {
                let value = bincode::deserialize(&data)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StorageError::Unavailable(format!(
                "Failed to read snapshot: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use perpetua_ledger::Role;

    #[test]
    fn test_missing_snapshots_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let db = PlatformDb::open(dir.path()).unwrap();
        assert!(db.load_ledger().unwrap().is_none());
        assert!(db.load_governance().unwrap().is_none());
    }

    #[test]
    fn test_ledger_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = PlatformDb::open(dir.path()).unwrap();

        let now = Utc::now();
        let mut book = LedgerBook::new();
        let alice = book
            .create_account("alice", Role::Member, 1000.0, now)
            .unwrap()
            .id;
        book.lock_tokens(&alice, 250.0, 30, now).unwrap();

        db.save_ledger(&book).unwrap();
        let loaded = db.load_ledger().unwrap().unwrap();
        assert_eq!(loaded.balance_of(&alice).unwrap(), 750.0);
        assert_eq!(loaded.locked_tokens(&alice, now).len(), 1);
    }

    #[test]
    fn test_governance_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = PlatformDb::open(dir.path()).unwrap();

        let now = Utc::now();
        let mut registry = GovernanceRegistry::new();
        let proposal = registry
            .create_proposal(
                "creator",
                perpetua_governance::NewProposal {
                    title: "Snapshot round trip".to_string(),
                    description: "Check that registry state survives persistence".to_string(),
                    options: vec!["Yes".to_string(), "No".to_string()],
                    end_date: now + chrono::Duration::days(3),
                    category: None,
                    tags: None,
                },
                150.0,
                now,
            )
            .unwrap();
        registry
            .cast_vote("alice", &proposal.id, &proposal.options[0].id, 42.0, now)
            .unwrap();

        db.save_governance(&registry).unwrap();
        let loaded = db.load_governance().unwrap().unwrap();
        let stored = loaded.proposal(&proposal.id).unwrap();
        assert_eq!(stored.options[0].vote_count, 42.0);
        assert!(loaded.vote_of("alice", &proposal.id).is_some());
    }

    #[test]
    fn test_save_all_persists_both_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let db = PlatformDb::open(dir.path()).unwrap();

        let now = Utc::now();
        let mut book = LedgerBook::new();
        let alice = book
            .create_account("alice", Role::Member, 500.0, now)
            .unwrap()
            .id;
        let mut registry = GovernanceRegistry::new();
        registry
            .create_proposal(
                &alice,
                perpetua_governance::NewProposal {
                    title: "Shutdown snapshot".to_string(),
                    description: "Both stores are written by one save_all call".to_string(),
                    options: vec!["Yes".to_string(), "No".to_string()],
                    end_date: now + chrono::Duration::days(3),
                    category: None,
                    tags: None,
                },
                150.0,
                now,
            )
            .unwrap();

        db.save_all(&book, &registry).unwrap();
        assert_eq!(
            db.load_ledger().unwrap().unwrap().balance_of(&alice).unwrap(),
            500.0
        );
        assert_eq!(db.load_governance().unwrap().unwrap().categories().len(), 0);
    }
}
