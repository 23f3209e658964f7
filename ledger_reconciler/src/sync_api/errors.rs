use thiserror::Error;

use crate::traits::{LedgerSourceError, TransactionStoreError};

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Could not fetch ledger page {page}. {source}")]
    Source { page: u32, source: LedgerSourceError },
    #[error("{0}")]
    Store(#[from] TransactionStoreError),
}
