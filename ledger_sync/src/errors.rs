use coins_api::CoinsApiError;
use ledger_reconciler::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncServerError {
    #[error("Could not initialize the sync service. {0}")]
    InitializeError(String),
    #[error("Invalid sync service configuration. {0}")]
    ConfigurationError(String),
    #[error("Could not set up the transaction store. {0}")]
    DatabaseError(String),
    #[error("The ledger API client could not be created. {0}")]
    LedgerApiError(#[from] CoinsApiError),
    #[error("Sync failed. {0}")]
    SyncFailed(#[from] SyncError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}
