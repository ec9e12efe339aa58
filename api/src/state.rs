//! API state management

use perpetua_governance::GovernanceRegistry;
use perpetua_ledger::LedgerBook;
use perpetua_storage::PlatformDb;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chain::ChainClient;

#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<RwLock<LedgerBook>>,
    pub governance: Arc<RwLock<GovernanceRegistry>>,
    /// Snapshot store; None runs fully in memory (tests, dev).
    pub store: Option<Arc<PlatformDb>>,
    pub chain: Arc<dyn ChainClient>,
    pub start_time: std::time::Instant,
    pub dev_mode: bool,
}

impl ApiState {
    pub fn new(
        ledger: Arc<RwLock<LedgerBook>>,
        governance: Arc<RwLock<GovernanceRegistry>>,
        store: Option<Arc<PlatformDb>>,
        chain: Arc<dyn ChainClient>,
        dev_mode: bool,
    ) -> Self {
        Self {
            ledger,
            governance,
            store,
            chain,
            start_time: std::time::Instant::now(),
            dev_mode,
        }
    }

    /// Write both snapshots after a committed mutation. Best effort: a
    /// store failure is logged, never unwound into the response.
    pub async fn persist(&self) {
        if let Some(store) = &self.store {
            let book = self.ledger.read().await;
            let registry = self.governance.read().await;
            if let Err(e) = store.save_all(&book, &registry) {
                tracing::error!(error = %e, "failed to persist snapshot after mutation");
            }
        }
    }
}
