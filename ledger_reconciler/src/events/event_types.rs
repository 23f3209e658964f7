use serde::{Deserialize, Serialize};

use crate::{db_types::ReconciledTransaction, sync_api::SyncReport, traits::UpsertResult};

/// A reconciled transaction was written to the store, either for the first time or because it changed (typically an
/// unpaired sell whose reward has now been posted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSyncedEvent {
    pub transaction: ReconciledTransaction,
    pub change: UpsertResult,
}

impl TransactionSyncedEvent {
    pub fn new(transaction: ReconciledTransaction, change: UpsertResult) -> Self {
        Self { transaction, change }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCompletedEvent {
    pub report: SyncReport,
}

impl SyncCompletedEvent {
    pub fn new(report: SyncReport) -> Self {
        Self { report }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    TransactionSynced(TransactionSyncedEvent),
    SyncCompleted(SyncCompletedEvent),
}
