use thiserror::Error;

use super::UpsertResult;
use crate::db_types::ReconciledTransaction;

/// The persistence sink for reconciled transactions.
///
/// Every write is an upsert keyed on the transaction id, so replaying a sync (or part of one) is always safe.
#[allow(async_fn_in_trait)]
pub trait TransactionStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts the transaction, or updates the stored copy if it differs. Implementations must call
    /// [`ReconciledTransaction::validate`] first and refuse invalid records.
    async fn upsert_transaction(&self, transaction: &ReconciledTransaction)
        -> Result<UpsertResult, TransactionStoreError>;

    async fn fetch_transaction(&self, id: &str) -> Result<Option<ReconciledTransaction>, TransactionStoreError>;

    /// Sells that were stored without a partner, oldest first.
    async fn fetch_unpaired_sells(&self) -> Result<Vec<ReconciledTransaction>, TransactionStoreError>;

    /// The id of the most recent transaction in the store. Paired sells are dated by the sell entry, not the reward,
    /// since the sell is the entry the ledger API will serve first.
    async fn latest_transaction_id(&self) -> Result<Option<String>, TransactionStoreError>;

    /// The number of raw ledger entries the stored transactions account for. A paired sell counts twice.
    async fn ledger_entry_count(&self) -> Result<u64, TransactionStoreError>;

    /// The newest transaction stored by the last sync that ran to completion, if there has been one. Everything older
    /// than it is known to be in the store.
    async fn sync_checkpoint(&self) -> Result<Option<String>, TransactionStoreError>;

    async fn save_sync_checkpoint(&self, id: &str) -> Result<(), TransactionStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum TransactionStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Transaction {id} was refused. {reason}")]
    ValidationError { id: String, reason: String },
}

impl From<sqlx::Error> for TransactionStoreError {
    fn from(e: sqlx::Error) -> Self {
        TransactionStoreError::DatabaseError(e.to_string())
    }
}
